//! Describes the three weather datasets the collector maintains and the rules
//! that differ between them: identity keys, timestamp locations, write
//! strategies and which fetch executor serves them.

use std::fmt;
use std::str::FromStr;

/// One of the independently refreshed weather datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dataset {
    /// Named cities, fetched in batches from Open-Meteo.
    City,
    /// A regular 1-degree lat/lon grid, fetched in batches from Open-Meteo.
    Grid,
    /// Harbours, fetched one by one from the BMKG maritime API.
    Port,
}

/// How a dataset snapshot is written back to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStrategy {
    /// Each outcome upserts its own identity; absent identities stay untouched.
    Merge,
    /// The previous snapshot is deleted and the new one bulk-inserted.
    Replace,
}

/// Which executor drives the remote calls for a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorKind {
    /// One remote call per batch of locations.
    Batch,
    /// One remote call per location on a bounded worker pool.
    Concurrent,
}

impl Dataset {
    /// All datasets, in the order a full cycle runs them.
    pub const ALL: [Dataset; 3] = [Dataset::City, Dataset::Grid, Dataset::Port];

    pub fn name(&self) -> &'static str {
        match self {
            Dataset::City => "city",
            Dataset::Grid => "grid",
            Dataset::Port => "port",
        }
    }

    /// Maximum age, in hours, before the dataset is considered stale.
    pub fn default_max_age_hours(&self) -> f64 {
        match self {
            Dataset::City => 6.0,
            Dataset::Grid => 12.0,
            Dataset::Port => 6.0,
        }
    }

    /// Dotted path of the fetch timestamp inside a stored weather document.
    pub fn fetched_at_path(&self) -> &'static str {
        match self {
            Dataset::City | Dataset::Grid => "weather_data.fetched_at",
            Dataset::Port => "fetched_at",
        }
    }

    /// Document field holding the identity key in weather and metadata documents.
    pub fn identity_field(&self) -> &'static str {
        match self {
            Dataset::City | Dataset::Grid => "name",
            Dataset::Port => "slug",
        }
    }

    pub fn write_strategy(&self) -> WriteStrategy {
        match self {
            Dataset::Grid => WriteStrategy::Replace,
            Dataset::City | Dataset::Port => WriteStrategy::Merge,
        }
    }

    pub fn executor_kind(&self) -> ExecutorKind {
        match self {
            Dataset::City | Dataset::Grid => ExecutorKind::Batch,
            Dataset::Port => ExecutorKind::Concurrent,
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Dataset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "city" | "cities" => Ok(Dataset::City),
            "grid" => Ok(Dataset::Grid),
            "port" | "ports" => Ok(Dataset::Port),
            other => Err(format!(
                "Unknown dataset: '{}'. Valid options: city, grid, port",
                other
            )),
        }
    }
}

//! Location records resolved at the start of a collection run.

use crate::types::dataset::Dataset;
use crate::utils::create_slug;
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Both components are finite and inside the valid degree ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// One location of a dataset, keyed by that dataset's natural identity.
///
/// The identity is fixed when the record is built: a city keeps its name, a
/// grid point its `"lat, lon"` label, a port its slug. Moving the coordinates
/// afterwards does not change which document the record maps to.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub identity: String,
    pub coordinates: Coordinates,
    pub display_name: String,
}

impl LocationRecord {
    pub fn city(name: &str, lat: f64, lon: f64) -> Self {
        Self {
            identity: name.to_string(),
            coordinates: Coordinates::new(lat, lon),
            display_name: name.to_string(),
        }
    }

    pub fn grid(lat: f64, lon: f64) -> Self {
        let label = grid_label(lat, lon);
        Self {
            identity: label.clone(),
            coordinates: Coordinates::new(lat, lon),
            display_name: label,
        }
    }

    /// Builds a port record. Without a known slug one is derived from the name.
    pub fn port(name: &str, slug: Option<&str>, lat: f64, lon: f64) -> Self {
        let slug = match slug.map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => create_slug(name),
        };
        Self {
            identity: slug,
            coordinates: Coordinates::new(lat, lon),
            display_name: name.to_string(),
        }
    }

    /// Builds a record using the identity rule of `dataset`.
    pub fn for_dataset(dataset: Dataset, name: &str, lat: f64, lon: f64) -> Self {
        match dataset {
            Dataset::City => Self::city(name, lat, lon),
            Dataset::Grid => Self::grid(lat, lon),
            Dataset::Port => Self::port(name, None, lat, lon),
        }
    }

    /// Resource slug used by per-location APIs.
    pub fn slug(&self) -> String {
        if self.identity.is_empty() {
            create_slug(&self.display_name)
        } else {
            self.identity.clone()
        }
    }
}

/// Display label and identity of a grid point, e.g. `"-6.0, 106.0"`.
pub fn grid_label(lat: f64, lon: f64) -> String {
    format!("{:.1}, {:.1}", lat, lon)
}

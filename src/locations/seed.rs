//! Static seed sources, read when a dataset's metadata collection is empty.

use crate::locations::error::SeedError;
use crate::types::dataset::Dataset;
use crate::types::location::LocationRecord;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

pub const CITY_SEED_FILE: &str = "namaKota.json";
pub const GRID_SEED_FILE: &str = "gridData_1degree.json";
pub const PORT_SEED_FILE: &str = "pelabuhan.json";

/// Integer-degree box synthesised when the grid seed is unreadable.
pub const FALLBACK_GRID_LATITUDES: std::ops::RangeInclusive<i32> = -11..=6;
pub const FALLBACK_GRID_LONGITUDES: std::ops::RangeInclusive<i32> = 95..=141;

/// One seed entry. `extra` carries any additional fields the seed file had,
/// which are kept on the metadata document.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedRecord {
    pub name: String,
    pub slug: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub extra: Map<String, Value>,
}

impl SeedRecord {
    pub fn new(name: &str, lat: f64, lon: f64) -> Self {
        Self {
            name: name.to_string(),
            slug: None,
            lat,
            lon,
            extra: Map::new(),
        }
    }

    pub fn with_slug(mut self, slug: &str) -> Self {
        self.slug = Some(slug.to_string());
        self
    }

    pub fn to_location(&self, dataset: Dataset) -> LocationRecord {
        match dataset {
            Dataset::Port => LocationRecord::port(&self.name, self.slug.as_deref(), self.lat, self.lon),
            _ => LocationRecord::for_dataset(dataset, &self.name, self.lat, self.lon),
        }
    }
}

pub trait SeedSource: Send + Sync + Clone {
    fn load(&self, dataset: Dataset) -> impl Future<Output = Result<Vec<SeedRecord>, SeedError>> + Send;
}

/// Reads the seed files from a directory.
#[derive(Debug, Clone)]
pub struct JsonSeedFiles {
    dir: PathBuf,
}

impl JsonSeedFiles {
    pub fn new(dir: &Path) -> Self {
        Self { dir: dir.to_path_buf() }
    }

    pub fn path_for(&self, dataset: Dataset) -> PathBuf {
        let file = match dataset {
            Dataset::City => CITY_SEED_FILE,
            Dataset::Grid => GRID_SEED_FILE,
            Dataset::Port => PORT_SEED_FILE,
        };
        self.dir.join(file)
    }
}

impl SeedSource for JsonSeedFiles {
    async fn load(&self, dataset: Dataset) -> Result<Vec<SeedRecord>, SeedError> {
        let path = self.path_for(dataset);
        debug!("Reading {} seed from {:?}", dataset, path);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SeedError::Read(path.clone(), e))?;
        match dataset {
            Dataset::City => parse_city_seed(&path, &text),
            Dataset::Grid => parse_grid_seed(&path, &text),
            Dataset::Port => parse_port_seed(&path, &text),
        }
    }
}

/// Seed records held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSeed {
    records: HashMap<Dataset, Vec<SeedRecord>>,
}

impl StaticSeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dataset: Dataset, records: Vec<SeedRecord>) -> Self {
        self.records.insert(dataset, records);
        self
    }
}

impl SeedSource for StaticSeed {
    async fn load(&self, dataset: Dataset) -> Result<Vec<SeedRecord>, SeedError> {
        self.records
            .get(&dataset)
            .cloned()
            .ok_or(SeedError::Unsupported(dataset))
    }
}

/// `{"Jakarta": {"latitude": -6.2, "longitude": 106.8, ...}, ...}`
pub fn parse_city_seed(path: &Path, text: &str) -> Result<Vec<SeedRecord>, SeedError> {
    let value: Value = serde_json::from_str(text).map_err(|e| SeedError::Parse(path.to_path_buf(), e))?;
    let Value::Object(cities) = value else {
        return Err(SeedError::Format {
            path: path.to_path_buf(),
            detail: "expected an object keyed by city name".to_string(),
        });
    };

    let mut records = Vec::with_capacity(cities.len());
    for (name, entry) in cities {
        let lat = entry.get("latitude").and_then(Value::as_f64);
        let lon = entry.get("longitude").and_then(Value::as_f64);
        let (Some(lat), Some(lon)) = (lat, lon) else {
            warn!("Skipping city '{}' without coordinates", name);
            continue;
        };
        let mut record = SeedRecord::new(&name, lat, lon);
        if let Value::Object(fields) = entry {
            record.extra = fields
                .into_iter()
                .filter(|(k, _)| k != "latitude" && k != "longitude")
                .collect();
        }
        records.push(record);
    }
    Ok(records)
}

/// `{"latitude": "-11,-11,...", "longitude": "95,96,..."}`, possibly wrapped
/// in other text. The first balanced object is used and the two lists are
/// truncated to the shorter one.
pub fn parse_grid_seed(path: &Path, text: &str) -> Result<Vec<SeedRecord>, SeedError> {
    let format_error = |detail: &str| SeedError::Format {
        path: path.to_path_buf(),
        detail: detail.to_string(),
    };
    let block = first_json_object(text).ok_or_else(|| format_error("no JSON object found"))?;
    let value: Value = serde_json::from_str(block).map_err(|e| SeedError::Parse(path.to_path_buf(), e))?;

    let axis = |key: &str| -> Result<Vec<f64>, SeedError> {
        let raw = value
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| format_error(&format!("missing '{}' list", key)))?;
        raw.split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format_error(&format!("bad '{}' value: {}", key, e)))
    };
    let latitudes = axis("latitude")?;
    let longitudes = axis("longitude")?;
    if latitudes.len() != longitudes.len() {
        warn!(
            "Grid seed has {} latitudes and {} longitudes; using the first {}",
            latitudes.len(),
            longitudes.len(),
            latitudes.len().min(longitudes.len())
        );
    }

    Ok(latitudes
        .into_iter()
        .zip(longitudes)
        .map(|(lat, lon)| SeedRecord::new(&crate::types::location::grid_label(lat, lon), lat, lon))
        .collect())
}

/// Flat array in which a harbour name (a string containing "Pelabuhan") is
/// followed by its latitude and longitude.
pub fn parse_port_seed(path: &Path, text: &str) -> Result<Vec<SeedRecord>, SeedError> {
    let value: Value = serde_json::from_str(text).map_err(|e| SeedError::Parse(path.to_path_buf(), e))?;
    let Value::Array(items) = value else {
        return Err(SeedError::Format {
            path: path.to_path_buf(),
            detail: "expected a flat array".to_string(),
        });
    };

    Ok(items
        .windows(3)
        .filter_map(|window| match window {
            [Value::String(name), lat, lon] if name.contains("Pelabuhan") => {
                Some(SeedRecord::new(name, lat.as_f64()?, lon.as_f64()?))
            }
            _ => None,
        })
        .collect())
}

/// Every integer-degree point of the fallback box, latitude-major.
pub fn fallback_grid() -> Vec<SeedRecord> {
    FALLBACK_GRID_LATITUDES
        .flat_map(|lat| FALLBACK_GRID_LONGITUDES.map(move |lon| (lat as f64, lon as f64)))
        .map(|(lat, lon)| SeedRecord::new(&crate::types::location::grid_label(lat, lon), lat, lon))
        .collect()
}

/// Slice of `text` holding its first balanced `{...}` block.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

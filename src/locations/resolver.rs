use crate::config::CollectionNames;
use crate::locations::seed::{fallback_grid, SeedRecord, SeedSource};
use crate::reconciler::PersistenceReconciler;
use crate::store::document::{Document, FindQuery};
use crate::store::error::StoreError;
use crate::store::DocumentStore;
use crate::types::dataset::Dataset;
use crate::types::location::{Coordinates, LocationRecord};
use log::{info, warn};
use serde_json::Value;

/// Resolves the locations of a dataset: the metadata collection first, then
/// the seed source (writing what it found back to the metadata collection),
/// then, for the grid only, a synthesised fallback box.
///
/// Resolution never fails; an unresolvable dataset yields an empty list.
#[derive(Debug, Clone)]
pub struct LocationResolver<S: DocumentStore, D: SeedSource> {
    store: S,
    seeds: D,
    collections: CollectionNames,
    reconciler: PersistenceReconciler<S>,
}

impl<S: DocumentStore, D: SeedSource> LocationResolver<S, D> {
    pub fn new(store: S, seeds: D, collections: CollectionNames, reconciler: PersistenceReconciler<S>) -> Self {
        Self {
            store,
            seeds,
            collections,
            reconciler,
        }
    }

    pub async fn resolve(&self, dataset: Dataset) -> Vec<LocationRecord> {
        match self.from_metadata(dataset).await {
            Ok(locations) if !locations.is_empty() => {
                info!("Loaded {} {} locations from metadata", locations.len(), dataset);
                return locations;
            }
            Ok(_) => info!("No {} metadata stored; falling back to the seed source", dataset),
            Err(e) => warn!("Failed to read {} metadata, falling back to the seed source: {}", dataset, e),
        }

        let records = match self.seeds.load(dataset).await {
            Ok(records) if !records.is_empty() => records,
            Ok(_) if dataset == Dataset::Grid => {
                warn!("Grid seed is empty; synthesising the fallback grid");
                fallback_grid()
            }
            Err(e) if dataset == Dataset::Grid => {
                warn!("Grid seed unreadable ({}); synthesising the fallback grid", e);
                fallback_grid()
            }
            Ok(_) => {
                warn!("Seed source has no {} locations", dataset);
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to load {} seed: {}", dataset, e);
                return Vec::new();
            }
        };

        self.seed(dataset, &records).await;
        let locations: Vec<LocationRecord> = records
            .iter()
            .filter(|r| Coordinates::new(r.lat, r.lon).is_valid())
            .map(|r| r.to_location(dataset))
            .collect();
        info!("Resolved {} {} locations from the seed source", locations.len(), dataset);
        locations
    }

    /// Writes seed records to the metadata collection. Failure is logged and
    /// otherwise ignored.
    pub async fn seed(&self, dataset: Dataset, records: &[SeedRecord]) {
        if let Err(e) = self.reconciler.seed_metadata(dataset, records).await {
            warn!("Failed to seed {} metadata: {}", dataset, e);
        }
    }

    async fn from_metadata(&self, dataset: Dataset) -> Result<Vec<LocationRecord>, StoreError> {
        let documents = self
            .store
            .find(self.collections.metadata(dataset), &FindQuery::all())
            .await?;
        Ok(documents
            .iter()
            .filter_map(|d| location_from_metadata(dataset, d))
            .collect())
    }
}

/// Location described by a metadata document, or `None` when it lacks a
/// name or coordinates.
pub fn location_from_metadata(dataset: Dataset, document: &Document) -> Option<LocationRecord> {
    let number = |keys: &[&str]| keys.iter().find_map(|k| document.get(*k).and_then(as_number));
    let text = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| document.get(*k).and_then(Value::as_str))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };
    let lat = number(&["lat", "latitude"])?;
    let lon = number(&["lon", "longitude"])?;
    if !Coordinates::new(lat, lon).is_valid() {
        return None;
    }

    match dataset {
        Dataset::City => Some(LocationRecord::city(text(&["name"])?, lat, lon)),
        Dataset::Grid => {
            let mut record = LocationRecord::grid(lat, lon);
            if let Some(name) = text(&["name"]) {
                record.identity = name.to_string();
                record.display_name = name.to_string();
            }
            Some(record)
        }
        Dataset::Port => {
            let name = text(&["port_name", "name"]);
            let slug = text(&["slug"]);
            let display = name.or(slug)?;
            Some(LocationRecord::port(display, slug, lat, lon))
        }
    }
}

/// Numbers may be stored as JSON numbers or numeric strings.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

//! Projects fetch outcomes into stored documents and applies each dataset's
//! write strategy.
//!
//! Merge datasets (city, port) upsert one document per identity and leave
//! everything else alone. The grid dataset is replaced wholesale, but never
//! by an empty snapshot. Only successful outcomes are written, so a failed
//! location keeps whatever it had before.
//!
//! A replace inserts the new snapshot, tagged with a `snapshot_id`, before
//! it removes anything. A failed insert therefore leaves the previous
//! snapshot in place.

use crate::config::CollectionNames;
use crate::locations::seed::SeedRecord;
use crate::store::document::{document_from, Document, Filter};
use crate::store::error::StoreError;
use crate::store::DocumentStore;
use crate::types::dataset::{Dataset, WriteStrategy};
use crate::types::location::grid_label;
use crate::types::outcome::{FetchOutcome, WeatherPayload};
use crate::utils::{create_slug, format_timestamp};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use log::{debug, info, warn};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Field tagging every document of one replaced snapshot.
pub const SNAPSHOT_FIELD: &str = "snapshot_id";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct PersistenceReconciler<S: DocumentStore> {
    store: S,
    collections: CollectionNames,
    last_stamp: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl<S: DocumentStore> PersistenceReconciler<S> {
    pub fn new(store: S, collections: CollectionNames) -> Self {
        Self {
            store,
            collections,
            last_stamp: Arc::new(Mutex::new(None)),
        }
    }

    /// Writes one dataset snapshot. Outcomes that are not successful, or lack
    /// an identity or usable coordinates, are skipped one by one.
    pub async fn write(&self, dataset: Dataset, outcomes: &[FetchOutcome]) -> Result<WriteSummary, StoreError> {
        let collection = self.collections.weather(dataset);
        let mut documents = Vec::with_capacity(outcomes.len());
        let mut skipped = 0;
        for outcome in outcomes {
            match project(dataset, outcome) {
                Some(document) => documents.push((outcome.identity.clone(), document)),
                None => {
                    debug!(
                        "Not persisting {} outcome for '{}' ({})",
                        dataset, outcome.identity, outcome.status
                    );
                    skipped += 1;
                }
            }
        }

        let written = match dataset.write_strategy() {
            WriteStrategy::Merge => self.upsert_all(collection, dataset.identity_field(), documents).await?,
            WriteStrategy::Replace => {
                if documents.is_empty() {
                    warn!("Refusing to replace {} with an empty snapshot", collection);
                    return Ok(WriteSummary { written: 0, skipped });
                }
                self.replace_all(collection, documents.into_iter().map(|(_, d)| d).collect())
                    .await?
            }
        };

        info!("Wrote {} {} documents to '{}' ({} skipped)", written, dataset, collection, skipped);
        Ok(WriteSummary { written, skipped })
    }

    /// Upserts metadata documents for seeded locations, keyed by the
    /// dataset's identity.
    pub async fn seed_metadata(&self, dataset: Dataset, records: &[SeedRecord]) -> Result<usize, StoreError> {
        let collection = self.collections.metadata(dataset);
        let key = dataset.identity_field();
        let documents = records
            .iter()
            .filter(|r| r.lat.is_finite() && r.lon.is_finite())
            .map(|r| {
                let document = metadata_document(dataset, r);
                let identity = document.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
                (identity, document)
            })
            .filter(|(identity, _)| !identity.is_empty())
            .collect();
        let written = self.upsert_all(collection, key, documents).await?;
        info!("Seeded {} documents into '{}'", written, collection);
        Ok(written)
    }

    async fn upsert_all(
        &self,
        collection: &str,
        key: &str,
        documents: Vec<(String, Document)>,
    ) -> Result<usize, StoreError> {
        let mut written = 0;
        for (identity, mut document) in documents {
            document.insert("updated_at".to_string(), Value::String(self.next_stamp()));
            self.store
                .upsert(collection, &Filter::eq(key, identity), document)
                .await?;
            written += 1;
        }
        Ok(written)
    }

    async fn replace_all(&self, collection: &str, mut documents: Vec<Document>) -> Result<usize, StoreError> {
        let snapshot_id = self.next_stamp();
        for document in &mut documents {
            document.insert("updated_at".to_string(), Value::String(self.next_stamp()));
            document.insert(SNAPSHOT_FIELD.to_string(), Value::String(snapshot_id.clone()));
        }
        let inserted = self.store.insert_many(collection, documents).await?;
        let removed = self
            .store
            .delete_many(collection, &Filter::ne(SNAPSHOT_FIELD, snapshot_id.as_str()))
            .await?;
        debug!(
            "Replaced {} documents in '{}' with snapshot {} ({} documents)",
            removed, collection, snapshot_id, inserted
        );
        Ok(inserted as usize)
    }

    /// Millisecond timestamp strictly later than any previously issued one.
    fn next_stamp(&self) -> String {
        let now = Utc::now().trunc_subsecs(3);
        let mut last = self
            .last_stamp
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let stamp = match *last {
            Some(previous) if now <= previous => previous + Duration::milliseconds(1),
            _ => now,
        };
        *last = Some(stamp);
        format_timestamp(stamp)
    }
}

/// Stored form of a successful outcome, without `updated_at`.
pub fn project(dataset: Dataset, outcome: &FetchOutcome) -> Option<Document> {
    if !outcome.is_success() || outcome.identity.trim().is_empty() {
        return None;
    }
    let coordinates = outcome.coordinates.filter(|c| c.lat.is_finite() && c.lon.is_finite())?;
    let fetched_at = format_timestamp(outcome.fetched_at);

    let value = match (dataset, outcome.payload.as_ref()?) {
        (Dataset::City | Dataset::Grid, WeatherPayload::Current(report)) => {
            let current = &report.current;
            json!({
                "name": outcome.identity,
                "lat": coordinates.lat,
                "lon": coordinates.lon,
                "coordinates": {
                    "latitude": report.latitude,
                    "longitude": report.longitude,
                    "elevation": report.elevation,
                },
                "weather_data": {
                    "temperature_2m": current.temperature,
                    "relative_humidity_2m": current.relative_humidity,
                    "weather_code": current.weather_code,
                    "weather_description": current.condition().map(|c| c.description()),
                    "wind_speed_10m": current.wind_speed,
                    "wind_direction_10m": current.wind_direction,
                    "timestamp": report.observed_at,
                    "timezone": report.timezone,
                    "utc_offset_seconds": report.utc_offset_seconds,
                    "fetched_at": fetched_at,
                },
            })
        }
        (Dataset::Port, WeatherPayload::Port(forecast)) => json!({
            "port_name": forecast.name.clone().unwrap_or_else(|| outcome.display_name.clone()),
            "slug": outcome.identity,
            "coordinates": {"lat": coordinates.lat, "lon": coordinates.lon},
            "weather_data": forecast.body,
            "fetched_at": fetched_at,
            "status": outcome.status.as_str(),
        }),
        (dataset, _) => {
            warn!("Payload of '{}' does not belong to the {} dataset", outcome.identity, dataset);
            return None;
        }
    };
    Some(document_from(value))
}

/// Metadata document for a seed record, in the shape each dataset's
/// metadata collection uses.
pub fn metadata_document(dataset: Dataset, record: &SeedRecord) -> Document {
    let mut document = match dataset {
        Dataset::City => {
            let mut d = record.extra.clone();
            d.insert("name".to_string(), Value::from(record.name.clone()));
            d.insert("latitude".to_string(), Value::from(record.lat));
            d.insert("longitude".to_string(), Value::from(record.lon));
            d
        }
        Dataset::Grid => {
            let name = if record.name.trim().is_empty() {
                grid_label(record.lat, record.lon)
            } else {
                record.name.clone()
            };
            document_from(json!({"name": name, "lat": record.lat, "lon": record.lon}))
        }
        Dataset::Port => {
            let slug = record
                .slug
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| create_slug(&record.name));
            document_from(json!({
                "slug": slug,
                "port_name": record.name,
                "lat": record.lat,
                "lon": record.lon,
            }))
        }
    };
    document.remove("updated_at");
    document
}

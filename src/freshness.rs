use crate::config::CollectionNames;
use crate::store::document::{get_path, FindQuery};
use crate::store::error::StoreError;
use crate::store::DocumentStore;
use crate::types::dataset::Dataset;
use crate::utils::parse_timestamp;
use chrono::{DateTime, Utc};
use log::debug;
use serde_json::Value;

/// Freshness of one dataset at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct FreshnessReport {
    pub dataset: Dataset,
    pub is_fresh: bool,
    /// Hours since the newest stored fetch; `None` when there is none.
    pub age_hours: Option<f64>,
    pub last_fetch: Option<DateTime<Utc>>,
    pub max_age_hours: f64,
}

/// Decides whether a dataset needs refreshing from the newest fetch
/// timestamp in its weather collection. Read-only.
#[derive(Debug, Clone)]
pub struct FreshnessOracle<S: DocumentStore> {
    store: S,
    collections: CollectionNames,
}

impl<S: DocumentStore> FreshnessOracle<S> {
    pub fn new(store: S, collections: CollectionNames) -> Self {
        Self { store, collections }
    }

    /// Newest parseable fetch timestamp of `dataset`, compared as instants
    /// so stored values with different offsets order correctly. Unparseable
    /// values are ignored.
    pub async fn latest_fetch(&self, dataset: Dataset) -> Result<Option<DateTime<Utc>>, StoreError> {
        let path = dataset.fetched_at_path();
        let documents = self
            .store
            .find(self.collections.weather(dataset), &FindQuery::with_field(path))
            .await?;
        let latest = documents
            .iter()
            .filter_map(|d| get_path(d, path).and_then(Value::as_str))
            .filter_map(|raw| {
                let parsed = parse_timestamp(raw);
                if parsed.is_none() {
                    debug!("Ignoring unparseable {} timestamp '{}'", dataset, raw);
                }
                parsed
            })
            .max();
        Ok(latest)
    }

    pub async fn is_fresh(&self, dataset: Dataset, max_age_hours: f64) -> Result<bool, StoreError> {
        self.is_fresh_at(dataset, max_age_hours, Utc::now()).await
    }

    pub async fn is_fresh_at(
        &self,
        dataset: Dataset,
        max_age_hours: f64,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self.report_at(dataset, max_age_hours, now).await?.is_fresh)
    }

    pub async fn report(&self, dataset: Dataset, max_age_hours: f64) -> Result<FreshnessReport, StoreError> {
        self.report_at(dataset, max_age_hours, Utc::now()).await
    }

    pub async fn report_at(
        &self,
        dataset: Dataset,
        max_age_hours: f64,
        now: DateTime<Utc>,
    ) -> Result<FreshnessReport, StoreError> {
        let last_fetch = self.latest_fetch(dataset).await?;
        let age_hours = last_fetch.map(|last| age_hours(last, now));
        let is_fresh = age_hours.is_some_and(|age| age <= max_age_hours);
        debug!(
            "{} freshness: last fetch {:?}, age {:?} h, limit {} h, fresh: {}",
            dataset, last_fetch, age_hours, max_age_hours, is_fresh
        );
        Ok(FreshnessReport {
            dataset,
            is_fresh,
            age_hours,
            last_fetch,
            max_age_hours,
        })
    }
}

/// Hours elapsed between `last` and `now`, at millisecond resolution.
pub fn age_hours(last: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - last).num_milliseconds() as f64 / 3_600_000.0
}

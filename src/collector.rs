//! The collection orchestrator.
//!
//! For each requested dataset the collector checks freshness, resolves
//! locations, fetches through the dataset's executor and hands the snapshot
//! to the reconciler. Datasets run independently; a failure in one never
//! stops the others.

use crate::config::CollectorConfig;
use crate::error::CollectorError;
use crate::fetch::batch_executor::BatchFetchExecutor;
use crate::fetch::bmkg::{BmkgPortClient, PortWeatherApi};
use crate::fetch::concurrent_executor::ConcurrentFetchExecutor;
use crate::fetch::open_meteo::{BatchWeatherApi, OpenMeteoClient};
use crate::freshness::{FreshnessOracle, FreshnessReport};
use crate::locations::port_catalog::{BmkgCatalogDecoder, PortCatalogDecoder, PortCatalogEntry};
use crate::locations::resolver::LocationResolver;
use crate::locations::seed::{JsonSeedFiles, SeedRecord, SeedSource};
use crate::reconciler::PersistenceReconciler;
use crate::retry::RetryPolicy;
use crate::store::DocumentStore;
use crate::types::dataset::{Dataset, ExecutorKind};
use crate::types::location::{Coordinates, LocationRecord};
use crate::types::outcome::OutcomeCounts;
use bon::bon;
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// What one successful dataset run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub dataset: Dataset,
    /// The dataset was fresh and nothing was fetched.
    pub skipped_fresh: bool,
    pub locations: usize,
    pub outcomes: OutcomeCounts,
    pub written: usize,
    pub skipped: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    fn fresh(dataset: Dataset, elapsed: Duration) -> Self {
        Self {
            dataset,
            skipped_fresh: true,
            locations: 0,
            outcomes: OutcomeCounts::default(),
            written: 0,
            skipped: 0,
            elapsed,
        }
    }
}

/// Terminal state of one dataset in a collection cycle.
#[derive(Debug)]
pub enum DatasetRunStatus {
    Success(RunSummary),
    Failed { error: CollectorError, attempts: u32 },
}

impl DatasetRunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, DatasetRunStatus::Success(_))
    }
}

/// Result of a collection cycle, per dataset.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub results: BTreeMap<Dataset, DatasetRunStatus>,
}

impl CycleReport {
    pub fn all_succeeded(&self) -> bool {
        self.results.values().all(DatasetRunStatus::is_success)
    }

    pub fn failed(&self) -> Vec<Dataset> {
        self.results
            .iter()
            .filter(|(_, status)| !status.is_success())
            .map(|(dataset, _)| *dataset)
            .collect()
    }

    pub fn get(&self, dataset: Dataset) -> Option<&DatasetRunStatus> {
        self.results.get(&dataset)
    }
}

/// Keeps the city, grid and port datasets fresh.
///
/// # Examples
///
/// ```rust,no_run
/// # use weather_collector::{CollectorConfig, CollectorError, Dataset, MemoryStore, WeatherCollector};
/// # async fn run() -> Result<(), CollectorError> {
/// let collector = WeatherCollector::with_defaults(MemoryStore::new(), CollectorConfig::from_env())?;
/// let report = collector
///     .run_collection_cycle()
///     .datasets(&Dataset::ALL)
///     .call()
///     .await;
/// assert!(report.all_succeeded());
/// # Ok(())
/// # }
/// ```
pub struct WeatherCollector<S, B, P, D>
where
    S: DocumentStore,
    B: BatchWeatherApi,
    P: PortWeatherApi,
    D: SeedSource,
{
    config: CollectorConfig,
    oracle: FreshnessOracle<S>,
    resolver: LocationResolver<S, D>,
    reconciler: PersistenceReconciler<S>,
    batch_executor: BatchFetchExecutor<B>,
    port_executor: ConcurrentFetchExecutor<P>,
    port_api: P,
    catalog_decoder: Arc<dyn PortCatalogDecoder>,
    pipeline_retry: RetryPolicy<CollectorError>,
}

impl<S: DocumentStore> WeatherCollector<S, OpenMeteoClient, BmkgPortClient, JsonSeedFiles> {
    /// Collector talking to Open-Meteo and BMKG, seeded from `config.seed_dir`.
    pub fn with_defaults(store: S, config: CollectorConfig) -> Result<Self, CollectorError> {
        let batch_api = OpenMeteoClient::new(&config.open_meteo_url, &config.open_meteo_timezone, config.http_timeout)?;
        let port_api = BmkgPortClient::new(
            &config.bmkg_port_url,
            config.bmkg_catalog_url.as_deref(),
            config.port_timeout,
        )?;
        let seeds = JsonSeedFiles::new(&config.seed_dir);
        Ok(Self::builder()
            .store(store)
            .batch_api(batch_api)
            .port_api(port_api)
            .seeds(seeds)
            .config(config)
            .build())
    }
}

#[bon]
impl<S, B, P, D> WeatherCollector<S, B, P, D>
where
    S: DocumentStore,
    B: BatchWeatherApi,
    P: PortWeatherApi,
    D: SeedSource,
{
    /// Wires the collector from its collaborators. Without a `config` the
    /// defaults apply; without a `catalog_decoder` the BMKG layout is assumed.
    #[builder]
    pub fn new(
        store: S,
        batch_api: B,
        port_api: P,
        seeds: D,
        config: Option<CollectorConfig>,
        catalog_decoder: Option<Arc<dyn PortCatalogDecoder>>,
    ) -> Self {
        let config = config.unwrap_or_default();
        let collections = config.collections.clone();
        let reconciler = PersistenceReconciler::new(store.clone(), collections.clone());
        let batch_executor = BatchFetchExecutor::new(
            batch_api,
            RetryPolicy::batch(config.batch_max_attempts, config.rate_limit_backoff),
            config.inter_batch_delay,
            config.http_timeout,
        );
        let port_executor = ConcurrentFetchExecutor::new(
            port_api.clone(),
            config.port_workers,
            RetryPolicy::per_item(config.port_retries, config.port_retry_delay),
            config.port_timeout,
        );
        Self {
            oracle: FreshnessOracle::new(store.clone(), collections.clone()),
            resolver: LocationResolver::new(store, seeds, collections, reconciler.clone()),
            reconciler,
            batch_executor,
            port_executor,
            port_api,
            catalog_decoder: catalog_decoder.unwrap_or_else(|| Arc::new(BmkgCatalogDecoder)),
            pipeline_retry: RetryPolicy::pipeline(config.pipeline_max_attempts, config.pipeline_base_delay),
            config,
        }
    }

    /// Runs every requested dataset once, each wrapped in the pipeline retry
    /// policy. With `force` the freshness gate is bypassed.
    #[builder]
    pub async fn run_collection_cycle(&self, datasets: &[Dataset], force: Option<bool>) -> CycleReport {
        let force = force.unwrap_or(false);
        let mut report = CycleReport::default();
        for &dataset in datasets {
            if report.results.contains_key(&dataset) {
                continue;
            }
            // No stored fetch can be younger than negative infinity hours.
            let max_age_hours = if force { f64::NEG_INFINITY } else { self.config.max_age_hours(dataset) };
            let status = self.run_with_retry(dataset, max_age_hours).await;
            match &status {
                DatasetRunStatus::Success(summary) if summary.skipped_fresh => {
                    info!("{}: fresh, nothing to do", dataset)
                }
                DatasetRunStatus::Success(summary) => info!(
                    "{}: {} locations, {} succeeded, {} failed, {} errored, {} written in {:?}",
                    dataset,
                    summary.locations,
                    summary.outcomes.success,
                    summary.outcomes.failed,
                    summary.outcomes.error,
                    summary.written,
                    summary.elapsed
                ),
                DatasetRunStatus::Failed { error, attempts } => {
                    error!("{}: failed after {} attempt(s): {}", dataset, attempts, error)
                }
            }
            report.results.insert(dataset, status);
        }
        report
    }

    /// One dataset through the pipeline retry policy.
    pub async fn run_with_retry(&self, dataset: Dataset, max_age_hours: f64) -> DatasetRunStatus {
        let attempts = AtomicU32::new(0);
        let this = self;
        let counter = &attempts;
        let context = format!("{} pipeline", dataset);
        let result = self
            .pipeline_retry
            .run(&context, move |attempt| {
                counter.store(attempt, Ordering::SeqCst);
                this.run_dataset(dataset, max_age_hours)
            })
            .await;
        match result {
            Ok(summary) => DatasetRunStatus::Success(summary),
            Err(error) => DatasetRunStatus::Failed {
                error,
                attempts: attempts.load(Ordering::SeqCst),
            },
        }
    }

    /// One pass of the pipeline for `dataset`, without retries.
    ///
    /// A dataset younger than `max_age_hours` is skipped. A failed freshness
    /// read counts as stale.
    pub async fn run_dataset(&self, dataset: Dataset, max_age_hours: f64) -> Result<RunSummary, CollectorError> {
        let started = Instant::now();

        match self.oracle.is_fresh(dataset, max_age_hours).await {
            Ok(true) => return Ok(RunSummary::fresh(dataset, started.elapsed())),
            Ok(false) => info!("{} is stale (limit {} h); refreshing", dataset, max_age_hours),
            Err(e) => warn!("Freshness check for {} failed, treating as stale: {}", dataset, e),
        }

        let mut locations = self.resolver.resolve(dataset).await;
        if locations.is_empty() && dataset == Dataset::Port {
            locations = self.locations_from_catalog().await;
        }
        if locations.is_empty() {
            return Err(CollectorError::NoLocations(dataset));
        }

        let outcomes = match dataset.executor_kind() {
            ExecutorKind::Batch => {
                self.batch_executor
                    .fetch_all(&locations, self.config.batch_size)
                    .await
            }
            ExecutorKind::Concurrent => self.port_executor.fetch_all(locations.clone()).await,
        };
        let counts = OutcomeCounts::tally(&outcomes);
        if counts.success == 0 {
            return Err(CollectorError::EmptySnapshot(dataset));
        }

        let written = self.reconciler.write(dataset, &outcomes).await?;
        Ok(RunSummary {
            dataset,
            skipped_fresh: false,
            locations: locations.len(),
            outcomes: counts,
            written: written.written,
            skipped: written.skipped,
            elapsed: started.elapsed(),
        })
    }

    /// Freshness of one dataset; the configured limit applies unless
    /// `max_age_hours` is given.
    #[builder]
    pub async fn freshness(
        &self,
        dataset: Dataset,
        max_age_hours: Option<f64>,
    ) -> Result<FreshnessReport, CollectorError> {
        let max_age_hours = max_age_hours.unwrap_or_else(|| self.config.max_age_hours(dataset));
        Ok(self.oracle.report(dataset, max_age_hours).await?)
    }

    /// Freshness of every dataset against its configured limit.
    pub async fn status(&self) -> Result<Vec<FreshnessReport>, CollectorError> {
        let mut reports = Vec::with_capacity(Dataset::ALL.len());
        for dataset in Dataset::ALL {
            reports.push(self.freshness().dataset(dataset).call().await?);
        }
        Ok(reports)
    }

    /// Port locations from the remote catalog, seeded into port metadata.
    async fn locations_from_catalog(&self) -> Vec<LocationRecord> {
        let payload = match self.port_api.fetch_catalog().await {
            Ok(Some(payload)) => payload,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to download the port catalog: {}", e);
                return Vec::new();
            }
        };
        let records: Vec<SeedRecord> = self
            .catalog_decoder
            .decode(&payload)
            .iter()
            .filter_map(PortCatalogEntry::to_seed)
            .filter(|r| Coordinates::new(r.lat, r.lon).is_valid())
            .collect();
        if records.is_empty() {
            warn!("Port catalog yielded no entries with coordinates");
            return Vec::new();
        }
        info!("Resolved {} ports from the remote catalog", records.len());
        self.resolver.seed(Dataset::Port, &records).await;
        records.iter().map(|r| r.to_location(Dataset::Port)).collect()
    }
}

//! Mock APIs and store wrappers shared by the integration tests.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use weather_collector::{
    BatchWeatherApi, CollectorConfig, ConditionsReport, Coordinates, CurrentWeather, Document, DocumentStore,
    FetchError, Filter, FindQuery, LocationRecord, MemoryStore, PortForecast, PortWeatherApi, SeedRecord,
    StoreError,
};

// =============================================================================
// MockBatchApi
// =============================================================================

/// Batch API answering every coordinate with fixed conditions. Queued
/// errors are returned, one per call, before any success.
#[derive(Clone, Default)]
pub struct MockBatchApi {
    batch_sizes: Arc<Mutex<Vec<usize>>>,
    queued_errors: Arc<Mutex<VecDeque<FetchError>>>,
    always_fail: bool,
}

impl MockBatchApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_first(errors: Vec<FetchError>) -> Self {
        Self {
            queued_errors: Arc::new(Mutex::new(errors.into())),
            ..Self::default()
        }
    }

    pub fn always_failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    /// Number of coordinates in each call, in call order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.batch_sizes.lock().unwrap().len()
    }
}

impl BatchWeatherApi for MockBatchApi {
    async fn fetch_current(&self, coordinates: &[Coordinates]) -> Result<Vec<ConditionsReport>, FetchError> {
        self.batch_sizes.lock().unwrap().push(coordinates.len());
        if self.always_fail {
            return Err(FetchError::Other("connection reset by peer".to_string()));
        }
        if let Some(error) = self.queued_errors.lock().unwrap().pop_front() {
            return Err(error);
        }
        Ok(coordinates.iter().map(report_for).collect())
    }
}

pub fn report_for(coordinates: &Coordinates) -> ConditionsReport {
    ConditionsReport {
        latitude: coordinates.lat,
        longitude: coordinates.lon,
        elevation: Some(8.0),
        timezone: Some("Asia/Jakarta".to_string()),
        utc_offset_seconds: Some(25_200),
        observed_at: Some(1_763_251_200),
        current: CurrentWeather {
            temperature: Some(28.5),
            relative_humidity: Some(79.0),
            weather_code: Some(3),
            wind_speed: Some(7.2),
            wind_direction: Some(210.0),
        },
    }
}

pub fn rate_limited() -> FetchError {
    FetchError::RateLimited {
        url: "https://api.open-meteo.com/v1/forecast".to_string(),
        detail: "Minutely API request limit exceeded. Please try again in one minute.".to_string(),
    }
}

// =============================================================================
// MockPortApi
// =============================================================================

/// Port API returning a one-entry forecast for every slug except the ones
/// marked as failing, which answer HTTP 500. Each call takes `latency`.
#[derive(Clone, Default)]
pub struct MockPortApi {
    failing: Arc<HashSet<String>>,
    catalog: Option<Value>,
    latency: Duration,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockPortApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, slugs: &[&str]) -> Self {
        self.failing = Arc::new(slugs.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_catalog(mut self, catalog: Value) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl PortWeatherApi for MockPortApi {
    async fn fetch_port(&self, slug: &str) -> Result<PortForecast, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(slug) {
            return Err(FetchError::Rejected {
                url: format!("https://maritim.bmkg.go.id/api/pelabuhan?slug={}", slug),
                status: 500,
                detail: Some("Internal Server Error".to_string()),
            });
        }
        Ok(PortForecast {
            name: Some(format!("Pelabuhan {}", slug)),
            body: json!({
                "pelabuhan": format!("Pelabuhan {}", slug),
                "prakiraan": [{"cuaca": "Cerah Berawan", "gelombang": "0.5 - 1.25 m"}],
            }),
        })
    }

    async fn fetch_catalog(&self) -> Result<Option<Value>, FetchError> {
        Ok(self.catalog.clone())
    }
}

// =============================================================================
// FlakyStore
// =============================================================================

/// `MemoryStore` whose reads or inserts can be switched to fail.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    fail_reads: bool,
    fail_inserts: bool,
}

impl FlakyStore {
    pub fn failing_reads(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_reads: true,
            fail_inserts: false,
        }
    }

    pub fn failing_inserts(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_reads: false,
            fail_inserts: true,
        }
    }
}

impl DocumentStore for FlakyStore {
    async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Document>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        self.inner.find(collection, query).await
    }

    async fn upsert(&self, collection: &str, filter: &Filter, document: Document) -> Result<(), StoreError> {
        self.inner.upsert(collection, filter, document).await
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.inner.delete_many(collection, filter).await
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<u64, StoreError> {
        if self.fail_inserts {
            return Err(StoreError::Unavailable(format!("insert into '{}' refused", collection)));
        }
        self.inner.insert_many(collection, documents).await
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Config without pacing delays, for tests that do not measure time.
pub fn fast_config() -> CollectorConfig {
    CollectorConfig {
        inter_batch_delay: Duration::ZERO,
        port_retry_delay: Duration::ZERO,
        pipeline_base_delay: Duration::ZERO,
        ..CollectorConfig::default()
    }
}

/// `count` grid points on a 1-degree raster inside Indonesia.
pub fn grid_seed(count: usize) -> Vec<SeedRecord> {
    (0..count)
        .map(|i| {
            let lat = -11.0 + (i / 47) as f64;
            let lon = 95.0 + (i % 47) as f64;
            SeedRecord::new("", lat, lon)
        })
        .collect()
}

pub fn grid_locations(count: usize) -> Vec<LocationRecord> {
    grid_seed(count)
        .iter()
        .map(|r| LocationRecord::grid(r.lat, r.lon))
        .collect()
}

pub fn city_seed() -> Vec<SeedRecord> {
    vec![
        SeedRecord::new("Jakarta", -6.2, 106.8),
        SeedRecord::new("Ambon", -3.69, 128.18),
        SeedRecord::new("Denpasar", -8.65, 115.22),
    ]
}

pub fn port_seed(count: usize) -> Vec<SeedRecord> {
    (0..count)
        .map(|i| SeedRecord::new(&format!("Port {}", i), -6.0 - i as f64 * 0.1, 106.0 + i as f64 * 0.1))
        .collect()
}

mod collector;
mod config;
mod error;
mod fetch;
mod freshness;
mod locations;
mod reconciler;
mod retry;
mod store;
mod types;
mod utils;

pub use collector::*;
pub use config::{CollectionNames, CollectorConfig};
pub use error::CollectorError;
pub use freshness::{age_hours, FreshnessOracle, FreshnessReport};
pub use reconciler::{metadata_document, project, PersistenceReconciler, WriteSummary, SNAPSHOT_FIELD};
pub use retry::RetryPolicy;
pub use utils::{create_slug, default_seed_dir, format_timestamp, parse_timestamp};

pub use fetch::batch_executor::{BatchFetchExecutor, DEFAULT_BATCH_SIZE};
pub use fetch::bmkg::{forecast_from_body, BmkgPortClient, PortWeatherApi, DEFAULT_BMKG_PORT_URL};
pub use fetch::concurrent_executor::{ConcurrentFetchExecutor, DEFAULT_WORKERS};
pub use fetch::error::FetchError;
pub use fetch::open_meteo::{decode_forecast, BatchWeatherApi, OpenMeteoClient, DEFAULT_OPEN_METEO_URL};

pub use locations::error::SeedError;
pub use locations::port_catalog::{BmkgCatalogDecoder, PortCatalogDecoder, PortCatalogEntry};
pub use locations::resolver::{location_from_metadata, LocationResolver};
pub use locations::seed::*;

pub use store::document::{Document, Filter, FindQuery, SortOrder};
pub use store::error::StoreError;
pub use store::memory::MemoryStore;
#[cfg(feature = "mongodb")]
pub use store::mongo::MongoStore;
pub use store::DocumentStore;

pub use types::current_weather::{ConditionsReport, CurrentWeather, CURRENT_VARIABLES};
pub use types::dataset::{Dataset, ExecutorKind, WriteStrategy};
pub use types::location::{grid_label, Coordinates, LocationRecord};
pub use types::outcome::{FetchOutcome, FetchStatus, OutcomeCounts, PortForecast, WeatherPayload};
pub use types::weather_condition::WeatherCondition;

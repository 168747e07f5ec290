use crate::fetch::bmkg::DEFAULT_BMKG_PORT_URL;
use crate::fetch::open_meteo::DEFAULT_OPEN_METEO_URL;
use crate::types::dataset::Dataset;
use crate::utils::default_seed_dir;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Names of the six collections the collector reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionNames {
    pub city_weather: String,
    pub grid_weather: String,
    pub port_weather: String,
    pub city_metadata: String,
    pub grid_metadata: String,
    pub port_metadata: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            city_weather: "city_weather".to_string(),
            grid_weather: "grid_weather".to_string(),
            port_weather: "port_weather".to_string(),
            city_metadata: "city_metadata".to_string(),
            grid_metadata: "grid_metadata".to_string(),
            port_metadata: "port_metadata".to_string(),
        }
    }
}

impl CollectionNames {
    pub fn weather(&self, dataset: Dataset) -> &str {
        match dataset {
            Dataset::City => &self.city_weather,
            Dataset::Grid => &self.grid_weather,
            Dataset::Port => &self.port_weather,
        }
    }

    pub fn metadata(&self, dataset: Dataset) -> &str {
        match dataset {
            Dataset::City => &self.city_metadata,
            Dataset::Grid => &self.grid_metadata,
            Dataset::Port => &self.port_metadata,
        }
    }
}

/// Every tunable of a collection run.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorConfig {
    pub mongo_uri: String,
    pub mongo_db: String,
    pub collections: CollectionNames,

    pub city_max_age_hours: f64,
    pub grid_max_age_hours: f64,
    pub port_max_age_hours: f64,

    pub batch_size: usize,
    pub inter_batch_delay: Duration,
    pub batch_max_attempts: u32,
    pub rate_limit_backoff: Duration,

    pub port_workers: usize,
    pub port_retries: u32,
    pub port_retry_delay: Duration,

    /// Per-call timeout for batch requests.
    pub http_timeout: Duration,
    /// Per-call timeout for port requests.
    pub port_timeout: Duration,

    pub pipeline_max_attempts: u32,
    pub pipeline_base_delay: Duration,

    pub open_meteo_url: String,
    pub open_meteo_timezone: String,
    pub bmkg_port_url: String,
    pub bmkg_catalog_url: Option<String>,

    pub seed_dir: PathBuf,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            mongo_uri: "mongodb://localhost:27017".to_string(),
            mongo_db: "weather_map".to_string(),
            collections: CollectionNames::default(),
            city_max_age_hours: Dataset::City.default_max_age_hours(),
            grid_max_age_hours: Dataset::Grid.default_max_age_hours(),
            port_max_age_hours: Dataset::Port.default_max_age_hours(),
            batch_size: 50,
            inter_batch_delay: Duration::from_secs(5),
            batch_max_attempts: 3,
            rate_limit_backoff: Duration::from_secs(60),
            port_workers: 10,
            port_retries: 2,
            port_retry_delay: Duration::from_secs(1),
            http_timeout: Duration::from_secs(30),
            port_timeout: Duration::from_secs(15),
            pipeline_max_attempts: 3,
            pipeline_base_delay: Duration::from_secs(5),
            open_meteo_url: DEFAULT_OPEN_METEO_URL.to_string(),
            open_meteo_timezone: "Asia/Jakarta".to_string(),
            bmkg_port_url: DEFAULT_BMKG_PORT_URL.to_string(),
            bmkg_catalog_url: None,
            seed_dir: default_seed_dir(),
        }
    }
}

impl CollectorConfig {
    /// Creates config from environment variables with fallback to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`CollectorConfig::from_env`], reading variables through `lookup`.
    /// Unset or unparseable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env = Env(&lookup);
        let defaults = Self::default();
        let c = defaults.collections;
        Self {
            mongo_uri: env.text("MONGO_URI", defaults.mongo_uri),
            mongo_db: env.text("MONGO_DB", defaults.mongo_db),
            collections: CollectionNames {
                city_weather: env.text("CITY_COLLECTION", c.city_weather),
                grid_weather: env.text("GRID_COLLECTION", c.grid_weather),
                port_weather: env.text("PORT_COLLECTION", c.port_weather),
                city_metadata: env.text("CITY_METADATA_COLLECTION", c.city_metadata),
                grid_metadata: env.text("GRID_METADATA_COLLECTION", c.grid_metadata),
                port_metadata: env.text("PORT_METADATA_COLLECTION", c.port_metadata),
            },
            city_max_age_hours: env.parse("CITY_MAX_AGE_HOURS", defaults.city_max_age_hours),
            grid_max_age_hours: env.parse("GRID_MAX_AGE_HOURS", defaults.grid_max_age_hours),
            port_max_age_hours: env.parse("PORT_MAX_AGE_HOURS", defaults.port_max_age_hours),
            batch_size: env.parse("BATCH_SIZE", defaults.batch_size).max(1),
            inter_batch_delay: env.secs("INTER_BATCH_DELAY_SECS", defaults.inter_batch_delay),
            batch_max_attempts: env.parse("BATCH_MAX_ATTEMPTS", defaults.batch_max_attempts).max(1),
            rate_limit_backoff: env.secs("RATE_LIMIT_BACKOFF_SECS", defaults.rate_limit_backoff),
            port_workers: env.parse("PORT_WORKERS", defaults.port_workers).max(1),
            port_retries: env.parse("PORT_RETRIES", defaults.port_retries),
            port_retry_delay: env.secs("PORT_RETRY_DELAY_SECS", defaults.port_retry_delay),
            http_timeout: env.secs("HTTP_TIMEOUT_SECS", defaults.http_timeout),
            port_timeout: env.secs("PORT_TIMEOUT_SECS", defaults.port_timeout),
            pipeline_max_attempts: env.parse("PIPELINE_MAX_ATTEMPTS", defaults.pipeline_max_attempts).max(1),
            pipeline_base_delay: env.secs("PIPELINE_BASE_DELAY_SECS", defaults.pipeline_base_delay),
            open_meteo_url: env.text("OPEN_METEO_URL", defaults.open_meteo_url),
            open_meteo_timezone: env.text("OPEN_METEO_TIMEZONE", defaults.open_meteo_timezone),
            bmkg_port_url: env.text("BMKG_PORT_URL", defaults.bmkg_port_url),
            bmkg_catalog_url: env.get("BMKG_CATALOG_URL"),
            seed_dir: env.get("SEED_DIR").map(PathBuf::from).unwrap_or(defaults.seed_dir),
        }
    }

    pub fn max_age_hours(&self, dataset: Dataset) -> f64 {
        match dataset {
            Dataset::City => self.city_max_age_hours,
            Dataset::Grid => self.grid_max_age_hours,
            Dataset::Port => self.port_max_age_hours,
        }
    }
}

/// Variable reader; blank values count as unset.
struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn text(&self, key: &str, default: String) -> String {
        self.get(key).unwrap_or(default)
    }

    fn parse<T: FromStr>(&self, key: &str, default: T) -> T {
        self.get(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
    }

    fn secs(&self, key: &str, default: Duration) -> Duration {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(default)
    }
}

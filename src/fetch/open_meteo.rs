use crate::fetch::error::{mentions_rate_limit, FetchError};
use crate::fetch::request_error;
use crate::types::current_weather::{ConditionsReport, CurrentWeather, CURRENT_VARIABLES};
use crate::types::location::Coordinates;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// A remote service answering current conditions for many coordinates in
/// one call. Entry `i` of the answer belongs to `coordinates[i]`.
pub trait BatchWeatherApi: Send + Sync + Clone {
    fn fetch_current(
        &self,
        coordinates: &[Coordinates],
    ) -> impl Future<Output = Result<Vec<ConditionsReport>, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
    timezone: String,
    timeout: Duration,
}

impl OpenMeteoClient {
    pub fn new(base_url: &str, timezone: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| FetchError::Other(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, base_url, timezone, timeout))
    }

    /// Reuses an existing connection pool.
    pub fn with_client(client: Client, base_url: &str, timezone: &str, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            timezone: timezone.to_string(),
            timeout,
        }
    }
}

impl BatchWeatherApi for OpenMeteoClient {
    async fn fetch_current(&self, coordinates: &[Coordinates]) -> Result<Vec<ConditionsReport>, FetchError> {
        if coordinates.is_empty() {
            return Ok(Vec::new());
        }
        let query = [
            ("latitude", join_axis(coordinates, |c: &Coordinates| c.lat)),
            ("longitude", join_axis(coordinates, |c: &Coordinates| c.lon)),
            ("current", CURRENT_VARIABLES.join(",")),
            ("timezone", self.timezone.clone()),
            ("timeformat", "unixtime".to_string()),
        ];
        debug!("Requesting current conditions for {} locations", coordinates.len());

        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| request_error(&self.base_url, self.timeout, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| request_error(&self.base_url, self.timeout, e))?;

        if !status.is_success() {
            let reason = error_reason(&body);
            warn!("Open-Meteo answered {} for {}: {:?}", status, self.base_url, reason);
            if status == StatusCode::TOO_MANY_REQUESTS || reason.as_deref().is_some_and(mentions_rate_limit) {
                return Err(FetchError::RateLimited {
                    url: self.base_url.clone(),
                    detail: reason.unwrap_or_else(|| status.to_string()),
                });
            }
            return Err(FetchError::Rejected {
                url: self.base_url.clone(),
                status: status.as_u16(),
                detail: reason,
            });
        }

        let reports = decode_forecast(&self.base_url, &body)?;
        if reports.len() != coordinates.len() {
            warn!(
                "Open-Meteo returned {} entries for {} requested locations",
                reports.len(),
                coordinates.len()
            );
        }
        Ok(reports)
    }
}

fn join_axis(coordinates: &[Coordinates], axis: fn(&Coordinates) -> f64) -> String {
    coordinates
        .iter()
        .map(|c| axis(c).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ForecastBody {
    Many(Vec<ForecastEntry>),
    One(ForecastEntry),
}

#[derive(Deserialize)]
struct ForecastEntry {
    latitude: f64,
    longitude: f64,
    elevation: Option<f64>,
    timezone: Option<String>,
    utc_offset_seconds: Option<i64>,
    #[serde(default)]
    current: Map<String, Value>,
}

impl From<ForecastEntry> for ConditionsReport {
    fn from(entry: ForecastEntry) -> Self {
        let values: Vec<Option<f64>> = CURRENT_VARIABLES
            .iter()
            .map(|name| entry.current.get(*name).and_then(Value::as_f64))
            .collect();
        ConditionsReport {
            latitude: entry.latitude,
            longitude: entry.longitude,
            elevation: entry.elevation,
            timezone: entry.timezone,
            utc_offset_seconds: entry.utc_offset_seconds,
            observed_at: entry.current.get("time").and_then(Value::as_i64),
            current: CurrentWeather::from_positional(&values),
        }
    }
}

/// Decodes a forecast body: an array for multi-location requests, a single
/// object for one location. An empty answer is malformed.
pub fn decode_forecast(url: &str, body: &str) -> Result<Vec<ConditionsReport>, FetchError> {
    let malformed = |detail: String| FetchError::Malformed {
        url: url.to_string(),
        detail,
    };
    let parsed: ForecastBody = serde_json::from_str(body).map_err(|e| {
        // A 200 carrying an error object still counts as a refusal.
        match error_reason(body) {
            Some(reason) if mentions_rate_limit(&reason) => FetchError::RateLimited {
                url: url.to_string(),
                detail: reason,
            },
            Some(reason) => malformed(reason),
            None => malformed(e.to_string()),
        }
    })?;
    let reports: Vec<ConditionsReport> = match parsed {
        ForecastBody::Many(entries) => entries.into_iter().map(ConditionsReport::from).collect(),
        ForecastBody::One(entry) => vec![entry.into()],
    };
    if reports.is_empty() {
        return Err(malformed("response contained no locations".to_string()));
    }
    Ok(reports)
}

/// `reason` of an `{"error": true, "reason": ".."}` body.
fn error_reason(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("reason")?.as_str().map(str::to_string)
}

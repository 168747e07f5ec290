use crate::types::current_weather::ConditionsReport;
use crate::types::location::{Coordinates, LocationRecord};
use chrono::{DateTime, Utc};
use std::fmt;

/// Terminal state of one remote call for one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStatus {
    Success,
    /// The remote answered with a well-formed non-2xx response.
    Failed,
    /// Transport or decoding failure after all retries.
    Error,
}

impl FetchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStatus::Success => "success",
            FetchStatus::Failed => "failed",
            FetchStatus::Error => "error",
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a successful fetch carried back.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherPayload {
    /// Positionally decoded current conditions (city and grid).
    Current(ConditionsReport),
    /// A port forecast document, kept as the remote sent it.
    Port(PortForecast),
}

/// BMKG harbour forecast response.
#[derive(Debug, Clone, PartialEq)]
pub struct PortForecast {
    /// Harbour name reported by the remote, if any.
    pub name: Option<String>,
    /// The complete response body.
    pub body: serde_json::Value,
}

impl PortForecast {
    /// Forecast entries (`prakiraan`), empty when the remote omitted them.
    pub fn forecasts(&self) -> &[serde_json::Value] {
        self.body
            .get("prakiraan")
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Result of one remote call for one location in one collection run.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub identity: String,
    pub display_name: String,
    pub coordinates: Option<Coordinates>,
    pub payload: Option<WeatherPayload>,
    pub fetched_at: DateTime<Utc>,
    pub status: FetchStatus,
    pub error_detail: Option<String>,
}

impl FetchOutcome {
    pub fn success(location: &LocationRecord, payload: WeatherPayload) -> Self {
        Self {
            identity: location.identity.clone(),
            display_name: location.display_name.clone(),
            coordinates: Some(location.coordinates),
            payload: Some(payload),
            fetched_at: Utc::now(),
            status: FetchStatus::Success,
            error_detail: None,
        }
    }

    pub fn failed(location: &LocationRecord, detail: String) -> Self {
        Self::unsuccessful(location, FetchStatus::Failed, detail)
    }

    pub fn error(location: &LocationRecord, detail: String) -> Self {
        Self::unsuccessful(location, FetchStatus::Error, detail)
    }

    fn unsuccessful(location: &LocationRecord, status: FetchStatus, detail: String) -> Self {
        Self {
            identity: location.identity.clone(),
            display_name: location.display_name.clone(),
            coordinates: Some(location.coordinates),
            payload: None,
            fetched_at: Utc::now(),
            status,
            error_detail: Some(detail),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }
}

/// Outcome counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub success: usize,
    pub failed: usize,
    pub error: usize,
}

impl OutcomeCounts {
    pub fn tally(outcomes: &[FetchOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut counts, outcome| {
            match outcome.status {
                FetchStatus::Success => counts.success += 1,
                FetchStatus::Failed => counts.failed += 1,
                FetchStatus::Error => counts.error += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> usize {
        self.success + self.failed + self.error
    }
}

use crate::fetch::bmkg::PortWeatherApi;
use crate::fetch::error::FetchError;
use crate::retry::RetryPolicy;
use crate::types::location::LocationRecord;
use crate::types::outcome::{FetchOutcome, OutcomeCounts, PortForecast, WeatherPayload};
use futures_util::{stream, StreamExt};
use log::{debug, info, warn};
use std::time::Duration;
use tokio::time::timeout;

pub const DEFAULT_WORKERS: usize = 10;

/// Fetches one location per call with at most `workers` calls in flight.
///
/// Every location yields exactly one outcome, in completion order.
#[derive(Debug, Clone)]
pub struct ConcurrentFetchExecutor<A: PortWeatherApi> {
    api: A,
    workers: usize,
    retry: RetryPolicy<FetchError>,
    call_timeout: Duration,
}

impl<A: PortWeatherApi> ConcurrentFetchExecutor<A> {
    pub fn new(api: A, workers: usize, retry: RetryPolicy<FetchError>, call_timeout: Duration) -> Self {
        Self {
            api,
            workers: workers.max(1),
            retry,
            call_timeout,
        }
    }

    pub async fn fetch_all(&self, locations: Vec<LocationRecord>) -> Vec<FetchOutcome> {
        let total = locations.len();
        info!("Fetching {} locations with {} workers", total, self.workers);

        let this = self;
        let outcomes: Vec<FetchOutcome> = stream::iter(locations)
            .map(move |location| this.fetch_one(location))
            .buffer_unordered(self.workers)
            .collect()
            .await;

        let counts = OutcomeCounts::tally(&outcomes);
        info!(
            "Concurrent fetch finished: {} succeeded, {} failed, {} errored of {}",
            counts.success, counts.failed, counts.error, total
        );
        outcomes
    }

    async fn fetch_one(&self, location: LocationRecord) -> FetchOutcome {
        let slug = location.slug();
        let context = format!("location '{}'", slug);
        let this = self;
        let slug_ref = slug.as_str();
        let result = self.retry.run(&context, move |_| this.call(slug_ref)).await;

        match result {
            Ok(forecast) if forecast.forecasts().is_empty() => {
                warn!("No forecast entries for '{}'", slug);
                FetchOutcome::failed(&location, "no forecast entries".to_string())
            }
            Ok(forecast) => {
                debug!("Fetched '{}'", slug);
                FetchOutcome::success(&location, WeatherPayload::Port(forecast))
            }
            Err(FetchError::Rejected { status, .. }) => FetchOutcome::failed(&location, format!("HTTP {}", status)),
            Err(e) => FetchOutcome::error(&location, e.to_string()),
        }
    }

    async fn call(&self, slug: &str) -> Result<PortForecast, FetchError> {
        match timeout(self.call_timeout, self.api.fetch_port(slug)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: format!("port '{}'", slug),
                after: self.call_timeout,
            }),
        }
    }
}

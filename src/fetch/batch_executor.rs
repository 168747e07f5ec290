use crate::fetch::error::FetchError;
use crate::fetch::open_meteo::BatchWeatherApi;
use crate::retry::RetryPolicy;
use crate::types::current_weather::ConditionsReport;
use crate::types::location::{Coordinates, LocationRecord};
use crate::types::outcome::{FetchOutcome, WeatherPayload};
use log::{error, info, warn};
use std::time::Duration;
use tokio::time::{sleep, timeout};

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Fetches locations through a batch API, one call per batch of
/// coordinates, sequentially and paced.
///
/// A batch that exhausts its retries is dropped: its locations get no
/// outcome this run.
#[derive(Debug, Clone)]
pub struct BatchFetchExecutor<A: BatchWeatherApi> {
    api: A,
    retry: RetryPolicy<FetchError>,
    inter_batch_delay: Duration,
    call_timeout: Duration,
}

impl<A: BatchWeatherApi> BatchFetchExecutor<A> {
    pub fn new(
        api: A,
        retry: RetryPolicy<FetchError>,
        inter_batch_delay: Duration,
        call_timeout: Duration,
    ) -> Self {
        Self {
            api,
            retry,
            inter_batch_delay,
            call_timeout,
        }
    }

    pub async fn fetch_all(&self, locations: &[LocationRecord], batch_size: usize) -> Vec<FetchOutcome> {
        let batches: Vec<&[LocationRecord]> = locations.chunks(batch_size.max(1)).collect();
        let total = batches.len();
        let mut outcomes = Vec::with_capacity(locations.len());

        for (index, batch) in batches.into_iter().enumerate() {
            let number = index + 1;
            info!("Fetching batch {}/{} ({} locations)", number, total, batch.len());
            match self.fetch_batch(batch, number, total).await {
                Ok(batch_outcomes) => {
                    outcomes.extend(batch_outcomes);
                    if number < total && !self.inter_batch_delay.is_zero() {
                        sleep(self.inter_batch_delay).await;
                    }
                }
                Err(e) => {
                    error!("Dropping batch {}/{} ({} locations): {}", number, total, batch.len(), e);
                }
            }
        }

        info!(
            "Batch fetch finished: {} of {} locations fetched",
            outcomes.len(),
            locations.len()
        );
        outcomes
    }

    async fn fetch_batch(
        &self,
        batch: &[LocationRecord],
        number: usize,
        total: usize,
    ) -> Result<Vec<FetchOutcome>, FetchError> {
        let coordinates: Vec<Coordinates> = batch.iter().map(|l| l.coordinates).collect();
        let context = format!("batch {}/{}", number, total);
        let this = self;
        let coordinates = coordinates.as_slice();
        let reports = self.retry.run(&context, move |_| this.call(coordinates)).await?;

        if reports.len() < batch.len() {
            warn!(
                "Batch {}/{}: {} locations missing from the response",
                number,
                total,
                batch.len() - reports.len()
            );
        }
        // Entries map to the batch by position.
        Ok(batch
            .iter()
            .zip(reports)
            .map(|(location, report)| FetchOutcome::success(location, WeatherPayload::Current(report)))
            .collect())
    }

    async fn call(&self, coordinates: &[Coordinates]) -> Result<Vec<ConditionsReport>, FetchError> {
        match timeout(self.call_timeout, self.api.fetch_current(coordinates)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: "batch weather call".to_string(),
                after: self.call_timeout,
            }),
        }
    }
}

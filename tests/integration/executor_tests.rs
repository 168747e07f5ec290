//! Batch and concurrent executor behaviour against mock APIs.

use std::time::Duration;

use tokio::time::Instant;
use weather_collector::{
    BatchFetchExecutor, ConcurrentFetchExecutor, FetchStatus, LocationRecord, OutcomeCounts, RetryPolicy,
    WeatherPayload,
};

use crate::integration::common::{grid_locations, rate_limited, MockBatchApi, MockPortApi};

fn batch_executor(api: MockBatchApi, inter_batch_delay: Duration) -> BatchFetchExecutor<MockBatchApi> {
    BatchFetchExecutor::new(
        api,
        RetryPolicy::batch(3, Duration::from_secs(60)),
        inter_batch_delay,
        Duration::from_secs(30),
    )
}

fn ports(count: usize) -> Vec<LocationRecord> {
    (0..count)
        .map(|i| LocationRecord::port(&format!("Port {}", i), None, -6.0, 106.0 + i as f64 * 0.01))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_batches_are_paced_but_not_after_the_last() {
    let api = MockBatchApi::new();
    let executor = batch_executor(api.clone(), Duration::from_secs(5));

    let start = Instant::now();
    let outcomes = executor.fetch_all(&grid_locations(120), 50).await;

    assert_eq!(outcomes.len(), 120);
    assert_eq!(api.batch_sizes(), vec![50, 50, 20]);
    // Two pauses between three batches.
    assert!(start.elapsed() >= Duration::from_secs(10));
    assert!(start.elapsed() < Duration::from_secs(11));
}

#[tokio::test]
async fn test_outcomes_follow_batch_order() {
    let locations = grid_locations(7);
    let executor = batch_executor(MockBatchApi::new(), Duration::ZERO);

    let outcomes = executor.fetch_all(&locations, 3).await;

    assert_eq!(outcomes.len(), 7);
    for (location, outcome) in locations.iter().zip(&outcomes) {
        assert_eq!(outcome.identity, location.identity);
        assert_eq!(outcome.status, FetchStatus::Success);
        match &outcome.payload {
            Some(WeatherPayload::Current(report)) => {
                assert_eq!(report.latitude, location.coordinates.lat);
                assert_eq!(report.longitude, location.coordinates.lon);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_backoff_doubles() {
    let api = MockBatchApi::failing_first(vec![rate_limited(), rate_limited()]);
    let executor = batch_executor(api.clone(), Duration::ZERO);

    let start = Instant::now();
    let outcomes = executor.fetch_all(&grid_locations(10), 50).await;

    assert_eq!(outcomes.len(), 10);
    assert_eq!(api.call_count(), 3);
    assert!(start.elapsed() >= Duration::from_secs(180));
    assert!(start.elapsed() < Duration::from_secs(181));
}

/// A batch is attempted at most three times, then dropped with no outcomes.
#[tokio::test]
async fn test_exhausted_batch_is_dropped() {
    let api = MockBatchApi::always_failing();
    let executor = batch_executor(api.clone(), Duration::ZERO);

    let outcomes = executor.fetch_all(&grid_locations(20), 50).await;

    assert!(outcomes.is_empty());
    assert_eq!(api.call_count(), 3);
}

/// One dropped batch does not stop later batches.
#[tokio::test(start_paused = true)]
async fn test_dropped_batch_does_not_stop_the_run() {
    let api = MockBatchApi::failing_first(vec![rate_limited(), rate_limited(), rate_limited()]);
    let executor = batch_executor(api.clone(), Duration::from_secs(5));

    let outcomes = executor.fetch_all(&grid_locations(15), 10).await;

    assert_eq!(outcomes.len(), 5, "only the second batch made it");
    assert_eq!(api.batch_sizes(), vec![10, 10, 10, 5]);
}

#[tokio::test]
async fn test_concurrent_executor_returns_one_outcome_per_location() {
    let api = MockPortApi::new().failing(&["port-1", "port-4", "port-9"]);
    let executor = ConcurrentFetchExecutor::new(api.clone(), 4, RetryPolicy::per_item(2, Duration::ZERO), Duration::from_secs(15));

    let outcomes = executor.fetch_all(ports(25)).await;

    assert_eq!(outcomes.len(), 25);
    let counts = OutcomeCounts::tally(&outcomes);
    assert_eq!(counts, OutcomeCounts { success: 22, failed: 3, error: 0 });
    let mut identities: Vec<_> = outcomes.iter().map(|o| o.identity.clone()).collect();
    identities.sort();
    identities.dedup();
    assert_eq!(identities.len(), 25);
    let failed = outcomes.iter().find(|o| o.identity == "port-4").unwrap();
    assert_eq!(failed.error_detail.as_deref(), Some("HTTP 500"));
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_is_bounded_by_workers() {
    let api = MockPortApi::new().with_latency(Duration::from_millis(100));
    let executor = ConcurrentFetchExecutor::new(api.clone(), 3, RetryPolicy::per_item(0, Duration::ZERO), Duration::from_secs(15));

    let start = Instant::now();
    let outcomes = executor.fetch_all(ports(9)).await;

    assert_eq!(outcomes.len(), 9);
    assert_eq!(api.max_in_flight(), 3);
    // Three waves of three calls.
    assert!(start.elapsed() >= Duration::from_millis(300));
    assert!(start.elapsed() < Duration::from_millis(400));
}

/// Calls exceeding the timeout are retried, then reported as errors.
#[tokio::test(start_paused = true)]
async fn test_slow_calls_time_out_into_error_outcomes() {
    let api = MockPortApi::new().with_latency(Duration::from_secs(20));
    let executor = ConcurrentFetchExecutor::new(api.clone(), 2, RetryPolicy::per_item(1, Duration::from_secs(1)), Duration::from_secs(15));

    let outcomes = executor.fetch_all(ports(2)).await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.status == FetchStatus::Error));
    assert_eq!(api.call_count(), 4, "one retry per location");
}

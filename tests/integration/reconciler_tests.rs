//! Write strategies of `PersistenceReconciler` against `MemoryStore`.

use serde_json::{json, Value};
use weather_collector::{
    parse_timestamp, CollectionNames, Dataset, DocumentStore, FetchOutcome, LocationRecord, MemoryStore,
    PersistenceReconciler, PortForecast, SeedRecord, WeatherPayload,
};

use crate::integration::common::{grid_locations, report_for, FlakyStore};

fn reconciler(store: &MemoryStore) -> PersistenceReconciler<MemoryStore> {
    PersistenceReconciler::new(store.clone(), CollectionNames::default())
}

fn current_outcome(location: &LocationRecord) -> FetchOutcome {
    FetchOutcome::success(location, WeatherPayload::Current(report_for(&location.coordinates)))
}

fn updated_at(document: &serde_json::Map<String, Value>) -> chrono::DateTime<chrono::Utc> {
    parse_timestamp(document["updated_at"].as_str().unwrap()).unwrap()
}

/// Writing the same outcome twice leaves one document whose `updated_at`
/// moved forward and whose other fields match the latest write.
#[tokio::test]
async fn test_upsert_is_idempotent_per_identity() {
    let store = MemoryStore::new();
    let reconciler = reconciler(&store);
    let jakarta = LocationRecord::city("Jakarta", -6.2, 106.8);
    let outcome = current_outcome(&jakarta);

    reconciler.write(Dataset::City, &[outcome.clone()]).await.unwrap();
    let first = store.documents("city_weather");
    reconciler.write(Dataset::City, &[outcome]).await.unwrap();
    let second = store.documents("city_weather");

    assert_eq!(second.len(), 1);
    assert!(updated_at(&second[0]) > updated_at(&first[0]));
    let strip = |mut d: serde_json::Map<String, Value>| {
        d.remove("updated_at");
        d
    };
    assert_eq!(strip(first[0].clone()), strip(second[0].clone()));
    assert_eq!(second[0]["weather_data"]["weather_description"], "Overcast");
}

/// Merge leaves identities that were not part of the snapshot untouched.
#[tokio::test]
async fn test_merge_keeps_absent_identities() {
    let store = MemoryStore::new();
    let reconciler = reconciler(&store);
    let ambon = LocationRecord::city("Ambon", -3.69, 128.18);
    let jakarta = LocationRecord::city("Jakarta", -6.2, 106.8);

    reconciler.write(Dataset::City, &[current_outcome(&ambon)]).await.unwrap();
    let summary = reconciler
        .write(
            Dataset::City,
            &[current_outcome(&jakarta), FetchOutcome::error(&ambon, "timeout".into())],
        )
        .await
        .unwrap();

    assert_eq!(summary.written, 1);
    assert_eq!(summary.skipped, 1);
    let names: Vec<_> = store
        .documents("city_weather")
        .iter()
        .map(|d| d["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Ambon", "Jakarta"]);
}

/// A grid snapshot of size N leaves exactly N documents; an empty snapshot
/// leaves the previous one in place.
#[tokio::test]
async fn test_grid_replace_is_complete_and_never_empty() {
    let store = MemoryStore::new();
    let reconciler = reconciler(&store);

    let first: Vec<_> = grid_locations(30).iter().map(current_outcome).collect();
    reconciler.write(Dataset::Grid, &first).await.unwrap();
    assert_eq!(store.count("grid_weather"), 30);

    let second: Vec<_> = grid_locations(60)[40..].iter().map(current_outcome).collect();
    let summary = reconciler.write(Dataset::Grid, &second).await.unwrap();
    assert_eq!(summary.written, 20);
    let names: Vec<_> = store
        .documents("grid_weather")
        .iter()
        .map(|d| d["name"].as_str().unwrap().to_string())
        .collect();
    let expected: Vec<_> = grid_locations(60)[40..].iter().map(|l| l.identity.clone()).collect();
    assert_eq!(names, expected);

    let summary = reconciler.write(Dataset::Grid, &[]).await.unwrap();
    assert_eq!(summary.written, 0);
    assert_eq!(store.count("grid_weather"), 20);

    let failures: Vec<_> = grid_locations(5)
        .iter()
        .map(|l| FetchOutcome::error(l, "connection reset".into()))
        .collect();
    reconciler.write(Dataset::Grid, &failures).await.unwrap();
    assert_eq!(store.count("grid_weather"), 20, "failures alone never clear the grid");
}

/// A grid replace whose insert fails leaves the previous snapshot whole.
#[tokio::test]
async fn test_failed_grid_insert_keeps_previous_snapshot() {
    let inner = MemoryStore::new();
    let previous: Vec<_> = grid_locations(3).iter().map(current_outcome).collect();
    reconciler(&inner).write(Dataset::Grid, &previous).await.unwrap();
    let before = inner.documents("grid_weather");

    let failing = PersistenceReconciler::new(FlakyStore::failing_inserts(inner.clone()), CollectionNames::default());
    let next = vec![current_outcome(&grid_locations(4)[3])];
    let result = failing.write(Dataset::Grid, &next).await;

    assert!(result.is_err());
    assert_eq!(inner.count("grid_weather"), 3);
    assert_eq!(inner.documents("grid_weather"), before);
}

#[tokio::test]
async fn test_port_documents_keep_the_remote_body() {
    let store = MemoryStore::new();
    let reconciler = reconciler(&store);
    let benoa = LocationRecord::port("Pelabuhan Benoa", Some("benoa"), -8.74, 115.21);
    let body = json!({"pelabuhan": "Benoa", "prakiraan": [{"cuaca": "Hujan Ringan"}]});
    let outcome = FetchOutcome::success(
        &benoa,
        WeatherPayload::Port(PortForecast {
            name: Some("Benoa".into()),
            body: body.clone(),
        }),
    );

    reconciler.write(Dataset::Port, &[outcome]).await.unwrap();

    let documents = store.documents("port_weather");
    assert_eq!(documents.len(), 1);
    let doc = &documents[0];
    assert_eq!(doc["slug"], "benoa");
    assert_eq!(doc["port_name"], "Benoa");
    assert_eq!(doc["weather_data"], body);
    assert_eq!(doc["coordinates"], json!({"lat": -8.74, "lon": 115.21}));
    assert_eq!(doc["status"], "success");
    assert!(parse_timestamp(doc["fetched_at"].as_str().unwrap()).is_some());
}

#[tokio::test]
async fn test_seeded_metadata_is_upserted_by_identity() {
    let store = MemoryStore::new();
    let reconciler = reconciler(&store);
    let records = vec![
        SeedRecord::new("Pelabuhan Benoa", -8.74, 115.21).with_slug("benoa"),
        SeedRecord::new("Pelabuhan Ambon", -3.69, 128.18),
    ];

    assert_eq!(reconciler.seed_metadata(Dataset::Port, &records).await.unwrap(), 2);
    assert_eq!(reconciler.seed_metadata(Dataset::Port, &records).await.unwrap(), 2);

    let documents = store.documents("port_metadata");
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[1]["slug"], "pelabuhan-ambon");

    let found = store
        .find("port_metadata", &weather_collector::FindQuery::all())
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
}

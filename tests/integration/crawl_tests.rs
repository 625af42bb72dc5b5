//! Integration tests for the populate crawl
//!
//! These tests use wiremock to stand in for the upstream proxy and run the
//! full years → makes → models cycle against a temporary database.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use vehicle_db::config::Config;
use vehicle_db::crawler::{populate, SilentProgress};
use vehicle_db::storage::{SharedStorage, SqliteStorage, Storage, YearStatus};
use vehicle_db::{Crawler, Endpoints, FailureLog, Fetcher, VehicleDbError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, db_path: &str) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config.api.timeout_secs = 5;
    config.crawler.max_concurrent_requests = 4;
    config.output.database_path = db_path.to_string();
    config
}

fn temp_db(dir: &TempDir) -> String {
    dir.path().join("vehicles.db").display().to_string()
}

async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn acme_models() -> Value {
    json!({"models": [
        {"id": "v1", "model": "Widget", "engines": [{"id": "e1", "name": "2.0L"}]}
    ]})
}

/// Mounts the single-year, single-make catalogue, optionally wrapped in `body`
async fn mount_acme(server: &MockServer, wrapped: bool) {
    let wrap = |value: Value| {
        if wrapped {
            json!({ "body": value })
        } else {
            value
        }
    };

    mount_json(server, "/years", wrap(json!([2024]))).await;
    mount_json(
        server,
        "/year/2024/makes",
        wrap(json!([{"makeId": 1, "makeName": "Acme"}])),
    )
    .await;
    mount_json(server, "/year/2024/make/Acme/models", wrap(acme_models())).await;
}

/// Every row in the database, in a comparable form; missing names read `NULL`
fn dump(db_path: &str) -> (Vec<(i32, YearStatus)>, Vec<(i64, String, i32)>, Vec<String>, Vec<String>) {
    let storage = SqliteStorage::new(std::path::Path::new(db_path)).expect("open database");

    let years: Vec<(i32, YearStatus)> = storage
        .list_years()
        .unwrap()
        .into_iter()
        .map(|y| (y.year, y.status))
        .collect();

    let mut makes = Vec::new();
    let mut models = Vec::new();
    let mut engines = Vec::new();
    for (year, _) in &years {
        for make in storage.makes_for_year(*year).unwrap() {
            for model in storage.models_for_make(*year, make.make_id).unwrap() {
                for engine in storage.engines_for_model(&model.vehicle_id).unwrap() {
                    engines.push(format!(
                        "{}|{}|{}",
                        engine.engine_id,
                        engine.vehicle_id,
                        engine.name.as_deref().unwrap_or("NULL")
                    ));
                }
                models.push(format!(
                    "{}|{}|{}|{}|{}",
                    model.vehicle_id,
                    model.name.as_deref().unwrap_or("NULL"),
                    model.year,
                    model.make_id,
                    model.make_name
                ));
            }
            makes.push((make.make_id, make.name, make.year));
        }
    }

    (years, makes, models, engines)
}

#[tokio::test]
async fn test_end_to_end_single_year() {
    let mock_server = MockServer::start().await;
    mount_acme(&mock_server, false).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = temp_db(&dir);
    let config = create_test_config(&mock_server.uri(), &db_path);

    let report = populate(&config, &SilentProgress)
        .await
        .expect("populate should succeed");

    assert_eq!(report.years_total, 1);
    assert_eq!(report.years_completed, 1);
    assert_eq!(report.fetch_failures, 0);

    let (years, makes, models, engines) = dump(&db_path);
    assert_eq!(years, vec![(2024, YearStatus::Completed)]);
    assert_eq!(makes, vec![(1, "Acme".to_string(), 2024)]);
    assert_eq!(models, vec!["v1|Widget|2024|1|Acme".to_string()]);
    assert_eq!(engines, vec!["e1|v1|2.0L".to_string()]);
}

#[tokio::test]
async fn test_recrawl_is_idempotent() {
    let mock_server = MockServer::start().await;
    mount_acme(&mock_server, false).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = temp_db(&dir);
    let config = create_test_config(&mock_server.uri(), &db_path);

    populate(&config, &SilentProgress).await.unwrap();
    let first = dump(&db_path);

    // Simulate an interrupted run so the year is crawled again
    rusqlite::Connection::open(&db_path)
        .unwrap()
        .execute("UPDATE years SET status = 'pending'", [])
        .unwrap();

    let report = populate(&config, &SilentProgress).await.unwrap();
    assert_eq!(report.years_completed, 1);

    assert_eq!(dump(&db_path), first);
}

#[tokio::test]
async fn test_completed_years_are_not_requested_again() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = temp_db(&dir);

    {
        let first_server = MockServer::start().await;
        mount_acme(&first_server, false).await;
        let config = create_test_config(&first_server.uri(), &db_path);
        populate(&config, &SilentProgress).await.unwrap();
    }

    let second_server = MockServer::start().await;
    mount_json(&second_server, "/years", json!([2024])).await;
    Mock::given(method("GET"))
        .and(path("/year/2024/makes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&second_server)
        .await;

    let config = create_test_config(&second_server.uri(), &db_path);
    let report = populate(&config, &SilentProgress).await.unwrap();

    assert_eq!(report.years_already_completed, 1);
    assert_eq!(report.years_completed, 0);
    // `expect(0)` is verified when the server drops
}

#[tokio::test]
async fn test_enveloped_responses_store_the_same_rows() {
    let plain_server = MockServer::start().await;
    mount_acme(&plain_server, false).await;
    let wrapped_server = MockServer::start().await;
    mount_acme(&wrapped_server, true).await;

    let dir = tempfile::tempdir().unwrap();
    let plain_db = dir.path().join("plain.db").display().to_string();
    let wrapped_db = dir.path().join("wrapped.db").display().to_string();

    populate(&create_test_config(&plain_server.uri(), &plain_db), &SilentProgress)
        .await
        .unwrap();
    populate(
        &create_test_config(&wrapped_server.uri(), &wrapped_db),
        &SilentProgress,
    )
    .await
    .unwrap();

    assert_eq!(dump(&plain_db), dump(&wrapped_db));
}

#[tokio::test]
async fn test_make_name_is_percent_encoded_in_path() {
    let mock_server = MockServer::start().await;
    mount_json(&mock_server, "/years", json!([2019])).await;
    mount_json(
        &mock_server,
        "/year/2019/makes",
        json!([{"makeId": 7, "makeName": "Land Rover"}]),
    )
    .await;
    mount_json(
        &mock_server,
        "/year/2019/make/Land%20Rover/models",
        json!({"models": [{"id": "lr1", "model": "Defender", "engines": []}]}),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = temp_db(&dir);
    populate(&create_test_config(&mock_server.uri(), &db_path), &SilentProgress)
        .await
        .unwrap();

    let (_, _, models, engines) = dump(&db_path);
    assert_eq!(models, vec!["lr1|Defender|2019|7|Land Rover".to_string()]);
    assert!(engines.is_empty());
}

#[tokio::test]
async fn test_failing_make_does_not_affect_siblings() {
    let mock_server = MockServer::start().await;
    mount_json(&mock_server, "/years", json!([2024])).await;
    mount_json(
        &mock_server,
        "/year/2024/makes",
        json!([
            {"makeId": 1, "makeName": "Acme"},
            {"makeId": 2, "makeName": "Brokenco"}
        ]),
    )
    .await;
    mount_json(&mock_server, "/year/2024/make/Acme/models", acme_models()).await;
    Mock::given(method("GET"))
        .and(path("/year/2024/make/Brokenco/models"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = temp_db(&dir);
    let report = populate(&create_test_config(&mock_server.uri(), &db_path), &SilentProgress)
        .await
        .unwrap();

    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.skipped_makes, 1);

    let (years, makes, models, _) = dump(&db_path);
    assert_eq!(years, vec![(2024, YearStatus::Completed)]);
    assert_eq!(makes.len(), 2);
    assert_eq!(models.len(), 1);
}

#[tokio::test]
async fn test_odd_make_id_does_not_hold_back_the_year() {
    let mock_server = MockServer::start().await;
    mount_json(&mock_server, "/years", json!([2024])).await;
    mount_json(
        &mock_server,
        "/year/2024/makes",
        json!([
            {"makeId": 1, "makeName": "Acme"},
            {"makeId": "2", "makeName": "Bolt"},
            {"makeName": "Nameless"}
        ]),
    )
    .await;
    mount_json(&mock_server, "/year/2024/make/Acme/models", acme_models()).await;
    mount_json(
        &mock_server,
        "/year/2024/make/Bolt/models",
        json!({"models": [{"id": "b1", "model": "Nut"}]}),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = temp_db(&dir);
    let report = populate(&create_test_config(&mock_server.uri(), &db_path), &SilentProgress)
        .await
        .unwrap();

    assert_eq!(report.years_pending, 0);
    assert_eq!(report.makes, 2);

    let (years, makes, models, _) = dump(&db_path);
    assert_eq!(years, vec![(2024, YearStatus::Completed)]);
    assert_eq!(
        makes,
        vec![(1, "Acme".to_string(), 2024), (2, "Bolt".to_string(), 2024)]
    );
    assert_eq!(models.len(), 2);
}

#[tokio::test]
async fn test_null_model_name_keeps_sibling_models() {
    let mock_server = MockServer::start().await;
    mount_json(&mock_server, "/years", json!([2024])).await;
    mount_json(
        &mock_server,
        "/year/2024/makes",
        json!([{"makeId": 1, "makeName": "Acme"}]),
    )
    .await;
    mount_json(
        &mock_server,
        "/year/2024/make/Acme/models",
        json!({"models": [
            {"id": "v1", "model": "Widget", "engines": [{"id": "e1", "name": null}]},
            {"id": "v2", "model": null}
        ]}),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = temp_db(&dir);
    let report = populate(&create_test_config(&mock_server.uri(), &db_path), &SilentProgress)
        .await
        .unwrap();

    assert_eq!(report.skipped_makes, 0);
    assert_eq!(report.models, 2);

    let (years, _, models, engines) = dump(&db_path);
    assert_eq!(years, vec![(2024, YearStatus::Completed)]);
    assert_eq!(
        models,
        vec![
            "v1|Widget|2024|1|Acme".to_string(),
            "v2|NULL|2024|1|Acme".to_string()
        ]
    );
    assert_eq!(engines, vec!["e1|v1|NULL".to_string()]);
}

#[tokio::test]
async fn test_unavailable_years_abort_the_run() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/years"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = temp_db(&dir);
    let result = populate(&create_test_config(&mock_server.uri(), &db_path), &SilentProgress).await;

    assert!(matches!(
        result,
        Err(VehicleDbError::YearsUnavailable { .. })
    ));
}

#[tokio::test]
async fn test_year_without_makes_stays_pending() {
    let mock_server = MockServer::start().await;
    mount_json(&mock_server, "/years", json!([2024, 2023])).await;
    mount_json(&mock_server, "/year/2024/makes", json!([])).await;
    mount_json(
        &mock_server,
        "/year/2023/makes",
        json!([{"makeId": 1, "makeName": "Acme"}]),
    )
    .await;
    mount_json(&mock_server, "/year/2023/make/Acme/models", acme_models()).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = temp_db(&dir);
    let report = populate(&create_test_config(&mock_server.uri(), &db_path), &SilentProgress)
        .await
        .unwrap();

    assert_eq!(report.years_completed, 1);
    assert_eq!(report.years_pending, 1);

    let (years, _, _, _) = dump(&db_path);
    assert_eq!(
        years,
        vec![(2024, YearStatus::Pending), (2023, YearStatus::Completed)]
    );
}

/// Serves a synthetic catalogue slowly and records peak concurrency
struct CountingFetcher {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl CountingFetcher {
    fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    fn respond(url: &Url) -> Value {
        let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
        match segments.as_slice() {
            ["api", "years"] => json!([2020, 2021, 2022, 2023, 2024]),
            ["api", "year", _, "makes"] => json!([
                {"makeId": 1, "makeName": "Acme"},
                {"makeId": 2, "makeName": "Bolt"},
                {"makeId": 3, "makeName": "Crank"}
            ]),
            ["api", "year", year, "make", make, "models"] => json!({"models": [
                {"id": format!("{}-{}", year, make), "model": "Base", "engines": []}
            ]}),
            _ => Value::Null,
        }
    }
}

#[async_trait]
impl Fetcher for CountingFetcher {
    async fn fetch(&self, url: &Url) -> Option<Value> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(15)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Some(Self::respond(url))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_in_flight_requests_never_exceed_ceiling() {
    let fetcher = Arc::new(CountingFetcher::new());
    let storage: SharedStorage = Arc::new(Mutex::new(SqliteStorage::open_in_memory().unwrap()));
    let endpoints = Endpoints::new("http://catalogue.test/api").unwrap();

    let crawler = Crawler::new(fetcher.clone(), FailureLog::new(), storage.clone(), endpoints, 3);
    let report = crawler.run(&SilentProgress).await.unwrap();

    // 1 years call + 5 makes calls + 15 models calls
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 21);
    assert_eq!(report.years_completed, 5);
    assert_eq!(report.models, 15);

    let peak = fetcher.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak in-flight requests was {}", peak);
    assert!(peak >= 2, "requests were never concurrent (peak {})", peak);

    assert_eq!(storage.lock().unwrap().count_models().unwrap(), 15);
}

//! Integration tests for the diagnostic probes

use serde_json::{json, Value};
use vehicle_db::config::ProbeConfig;
use vehicle_db::probe::{
    probe_interval_types, run_compliance, Category, EndpointTester, ProbeClient, TestStatus,
};
use vehicle_db::VehicleDbError;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VEHICLE: &str = "188569:13820";

fn probe(server: &MockServer) -> ProbeClient {
    let config = ProbeConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        ..ProbeConfig::default()
    };
    ProbeClient::new(&config).expect("probe client builds")
}

async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mounts a YMME tree with one year, make, model and vehicle
async fn mount_ymme(server: &MockServer) {
    mount_json(
        server,
        "/Information/YMME/Years",
        json!({"Body": [{"Year": 2023}, {"Year": 2025}, {"Year": 2024}]}),
    )
    .await;
    mount_json(
        server,
        "/Information/YMME/Years/2025/Makes",
        json!({"Body": [{"MakeID": 54, "MakeName": "Ford"}]}),
    )
    .await;
    mount_json(
        server,
        "/Information/YMME/Years/2025/Makes/54/Models",
        json!({"Body": [{"ModelID": 6021, "ModelName": "F-150"}]}),
    )
    .await;
    mount_json(
        server,
        "/Information/YMME/Years/2025/Makes/54/Models/6021/Vehicles",
        json!({"Body": [{"VehicleID": "777:1", "BaseVehicleID": 4242}]}),
    )
    .await;
}

const INTERVALS_PATH: &str = "/source/MOTOR/vehicle/188569:13820/maintenanceSchedules/intervals";

#[tokio::test]
async fn test_interval_probe_stops_when_miles_accepted() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(INTERVALS_PATH))
        .and(query_param("intervalType", "Miles"))
        .and(query_param("interval", "30000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let attempts = probe_interval_types(&probe(&mock_server), VEHICLE).await;

    assert_eq!(attempts.len(), 1);
    assert!(attempts[0].accepted);
}

#[tokio::test]
async fn test_interval_probe_tries_every_type_after_miles_fails() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(INTERVALS_PATH))
        .and(query_param("intervalType", "Month"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(INTERVALS_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad intervalType"))
        .mount(&mock_server)
        .await;

    let attempts = probe_interval_types(&probe(&mock_server), VEHICLE).await;

    let tried: Vec<&str> = attempts.iter().map(|a| a.interval_type).collect();
    assert_eq!(tried, vec!["Miles", "Distance", "Kilometers", "Month", "Months"]);
    let accepted: Vec<&str> = attempts
        .iter()
        .filter(|a| a.accepted)
        .map(|a| a.interval_type)
        .collect();
    assert_eq!(accepted, vec!["Month"]);
}

#[tokio::test]
async fn test_compliance_with_discovered_vehicle() {
    let mock_server = MockServer::start().await;
    mount_ymme(&mock_server).await;

    let base = "/source/MOTOR/vehicle/777:1";
    for route in ["specs", "procedures", "diagrams", "labor-times"] {
        mount_json(
            &mock_server,
            &format!("{}/{}", base, route),
            json!({"body": {"data": [{"id": 1}]}}),
        )
        .await;
    }
    // Fluids answers without the expected property
    mount_json(
        &mock_server,
        &format!("{}/fluids", base),
        json!({"body": {"items": []}}),
    )
    .await;
    mount_json(
        &mock_server,
        &format!("{}/categories", base),
        json!({"categories": [{"name": "Engine"}]}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/articles/v2", base)))
        .and(query_param("bucket", "Other"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&mock_server)
        .await;

    let report = run_compliance(&probe(&mock_server), VEHICLE).await.unwrap();

    assert_eq!(report.vehicle_id, "777:1");
    assert_eq!(report.total(), 7);
    assert_eq!(report.passed(), 6);
    assert!(report.results.contains(&("Fluids", false)));
}

#[tokio::test]
async fn test_compliance_falls_back_when_years_unavailable() {
    let mock_server = MockServer::start().await;
    mount_status(&mock_server, "/Information/YMME/Years", 500).await;
    mount_json(
        &mock_server,
        "/source/MOTOR/vehicle/188569:13820/specs",
        json!({"data": []}),
    )
    .await;

    let report = run_compliance(&probe(&mock_server), VEHICLE).await.unwrap();

    assert_eq!(report.vehicle_id, VEHICLE);
    assert_eq!(report.passed(), 1);
}

#[tokio::test]
async fn test_compliance_falls_back_on_unexpected_shape() {
    let mock_server = MockServer::start().await;
    mount_json(
        &mock_server,
        "/Information/YMME/Years",
        json!({"Years": [2024]}),
    )
    .await;

    let report = run_compliance(&probe(&mock_server), VEHICLE).await.unwrap();

    assert_eq!(report.vehicle_id, VEHICLE);
}

#[tokio::test]
async fn test_compliance_fails_when_later_step_has_no_data() {
    let mock_server = MockServer::start().await;
    mount_json(
        &mock_server,
        "/Information/YMME/Years",
        json!({"Body": [{"Year": 2024}]}),
    )
    .await;
    mount_status(&mock_server, "/Information/YMME/Years/2024/Makes", 404).await;

    let result = run_compliance(&probe(&mock_server), VEHICLE).await;

    assert!(matches!(result, Err(VehicleDbError::VehicleIdUnavailable)));
}

#[tokio::test]
async fn test_endpoint_tester_quick_run() {
    let mock_server = MockServer::start().await;
    mount_json(&mock_server, "/HelloWorld", json!({"Message": "Hello"})).await;
    mount_ymme(&mock_server).await;
    mount_status(
        &mock_server,
        "/Information/YMME/Years/2025/Makes/54/Models/6021/Engines",
        401,
    )
    .await;

    let mut tester = EndpointTester::new(probe(&mock_server));
    tester.run_quick().await;

    let results = tester.results();
    let status_of = |endpoint: &str| {
        results
            .iter()
            .find(|r| r.endpoint == endpoint)
            .map(|r| r.status)
    };

    assert_eq!(status_of("/HelloWorld"), Some(TestStatus::Success));
    assert_eq!(
        status_of("/Information/YMME/Years/2025/Makes"),
        Some(TestStatus::Success),
        "latest year should feed the makes call"
    );
    assert_eq!(
        status_of("/Information/YMME/Years/2025/Makes/54/Models/6021/Engines"),
        Some(TestStatus::Auth)
    );
    assert_eq!(
        status_of("/Information/YMME/Years/2025/Makes/54/Models/6021/BaseVehicle"),
        Some(TestStatus::Fail)
    );
    assert_eq!(
        status_of("/Information/Vehicles/Types"),
        Some(TestStatus::Fail)
    );

    let dir = tempfile::tempdir().unwrap();
    let saved = tester.save_results(dir.path()).unwrap();

    let file_name = saved.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with("test_results_"));
    assert!(file_name.ends_with(".json"));

    let report: Value = serde_json::from_str(&std::fs::read_to_string(&saved).unwrap()).unwrap();
    let entries = report.as_array().unwrap();
    assert_eq!(entries.len(), results.len());
    assert_eq!(entries[0]["endpoint"], "/HelloWorld");
    assert_eq!(entries[0]["status"], "SUCCESS");
    assert_eq!(entries[0]["http_code"], 200);
}

#[tokio::test]
async fn test_content_category_uses_discovered_base_vehicle() {
    let mock_server = MockServer::start().await;
    mount_ymme(&mock_server).await;
    mount_json(
        &mock_server,
        "/Information/Vehicles/Attributes/BaseVehicle/4242/Content/Summaries/Of/Parts",
        json!({"Body": {"Applications": [{"ApplicationID": 99}]}}),
    )
    .await;
    mount_json(
        &mock_server,
        "/Information/Vehicles/Attributes/BaseVehicle/4242/Content/Details/Of/Parts/99",
        json!({"Body": {}}),
    )
    .await;

    let mut tester = EndpointTester::new(probe(&mock_server));
    tester.run_category(Category::Content).await;

    let detail = tester
        .results()
        .iter()
        .find(|r| r.endpoint.ends_with("/Content/Details/Of/Parts/99"))
        .expect("application detail should be requested");
    assert_eq!(detail.status, TestStatus::Success);

    // VehicleImages has no taxonomy route
    assert!(!tester
        .results()
        .iter()
        .any(|r| r.endpoint.ends_with("/Content/Taxonomies/Of/VehicleImages")));
}

//! Categorised endpoint sweep
//!
//! Calls the documented proxy routes one at a time, records status, timing
//! and size of each response, and feeds identifiers discovered in earlier
//! responses (year, make, model, base vehicle) into later routes. Results
//! are printed as they arrive and saved as a JSON report at the end.

use crate::probe::{first_body_item, id_field, ymme_body, ProbeClient};
use crate::Result;
use chrono::Local;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

/// Year used when the years list cannot be read
const DEFAULT_YEAR: i64 = 2024;

/// Width of the endpoint column in result lines
const ENDPOINT_COLUMN: usize = 60;

const RULE_WIDTH: usize = 80;

/// Content types offered per base vehicle, with their console marker
const CONTENT_TYPES: [(&str, &str); 13] = [
    ("Parts", "🔧"),
    ("Specifications", "📋"),
    ("Fluids", "🛢️"),
    ("RecommendedFluids", "💧"),
    ("EstimatedWorkTimes", "⏱️"),
    ("MaintenanceSchedules", "📅"),
    ("ServiceProcedures", "📖"),
    ("DiagnosticTroubleCodes", "⚠️"),
    ("TechnicalServiceBulletins", "📄"),
    ("ComponentLocations", "📍"),
    ("WiringDiagrams", "🔌"),
    ("PartVectorIllustrations", "🖼️"),
    ("VehicleImages", "🚗"),
];

const COMMON_ENDPOINTS: [(&str, &str); 5] = [
    (
        "/Information/Content/Details/Of/AppRelationTypes",
        "App relation types",
    ),
    (
        "/Information/Content/Details/Of/ContentSilos",
        "Content silo mappings",
    ),
    (
        "/Information/Content/Details/Of/Taxonomies/By/ContentSilos",
        "Taxonomies by silo",
    ),
    (
        "/Information/Content/Details/Of/Specifications/Abbreviations",
        "Spec abbreviations",
    ),
    (
        "/Information/Content/Issuers/Of/TechnicalServiceBulletins",
        "TSB issuers",
    ),
];

const COMMERCIAL_ENDPOINTS: [(&str, &str); 3] = [
    (
        "/Information/Content/Summaries/Of/CommercialParts",
        "Commercial parts summary",
    ),
    (
        "/Information/Content/Summaries/Of/CommercialParts/Manufacturers",
        "Commercial parts manufacturers",
    ),
    (
        "/Information/Content/CommercialPartsInterchange/Providers",
        "Commercial interchange providers",
    ),
];

/// Classification of one endpoint call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    /// HTTP 200
    Success,
    /// Any status other than 200 and 401
    Fail,
    /// HTTP 401
    Auth,
    /// No response (timeout, connection failure)
    Error,
}

impl TestStatus {
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Success => "✅",
            Self::Fail => "❌",
            Self::Auth => "🔐",
            Self::Error => "💥",
        }
    }

    fn from_http(status: StatusCode) -> (Self, String) {
        match status {
            StatusCode::OK => (Self::Success, String::new()),
            StatusCode::UNAUTHORIZED => (Self::Auth, "Unauthorized".to_string()),
            StatusCode::NOT_FOUND => (Self::Fail, "Not Found".to_string()),
            other => (Self::Fail, format!("HTTP {}", other.as_u16())),
        }
    }
}

/// Record of one endpoint call
///
/// Only the fields kept in the JSON report are serialized.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub endpoint: String,
    pub method: &'static str,
    pub status: TestStatus,
    pub http_code: Option<u16>,
    pub duration_ms: u64,
    pub error: String,
    #[serde(skip)]
    pub response_size: usize,
    #[serde(skip)]
    pub sample: String,
}

impl TestResult {
    fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            method: "GET",
            status: TestStatus::Error,
            http_code: None,
            duration_ms: 0,
            error: String::new(),
            response_size: 0,
            sample: String::new(),
        }
    }
}

/// Endpoint groups that can be run on their own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Startup,
    Vehicles,
    Search,
    ChekChart,
    Content,
    Common,
    Commercial,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Startup,
        Category::Vehicles,
        Category::Search,
        Category::ChekChart,
        Category::Content,
        Category::Common,
        Category::Commercial,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Vehicles => "vehicles",
            Self::Search => "search",
            Self::ChekChart => "chek-chart",
            Self::Content => "content",
            Self::Common => "common",
            Self::Commercial => "commercial",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|c| c.name()).collect();
                format!("unknown category '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

/// Identifiers discovered along the way
#[derive(Debug, Clone)]
struct DiscoveredIds {
    year: i64,
    make_id: Option<String>,
    model_id: Option<String>,
    base_vehicle_id: Option<String>,
    vehicle_id: Option<String>,
    application_ids: HashMap<&'static str, String>,
}

impl Default for DiscoveredIds {
    fn default() -> Self {
        Self {
            year: DEFAULT_YEAR,
            make_id: None,
            model_id: None,
            base_vehicle_id: None,
            vehicle_id: None,
            application_ids: HashMap::new(),
        }
    }
}

/// Sequential endpoint sweep with a running result list
pub struct EndpointTester {
    probe: ProbeClient,
    results: Vec<TestResult>,
    ids: DiscoveredIds,
}

impl EndpointTester {
    pub fn new(probe: ProbeClient) -> Self {
        Self {
            probe,
            results: Vec::new(),
            ids: DiscoveredIds::default(),
        }
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Runs every category in order
    pub async fn run_all(&mut self) {
        self.print_banner("🧪 MOTOR API ENDPOINT TESTER", true);
        for category in Category::ALL {
            self.run_category_body(category).await;
        }
        self.print_summary();
    }

    /// Runs the startup and vehicle categories only
    pub async fn run_quick(&mut self) {
        self.print_banner("⚡ MOTOR API QUICK TEST", false);
        self.run_category_body(Category::Startup).await;
        self.run_category_body(Category::Vehicles).await;
        self.print_summary();
    }

    /// Runs a single category
    ///
    /// `content` needs a base vehicle, so the vehicle category runs first.
    pub async fn run_category(&mut self, category: Category) {
        self.print_banner(&format!("🧪 MOTOR API ENDPOINT TESTER ({})", category), true);
        if category == Category::Content {
            self.run_category_body(Category::Vehicles).await;
        }
        self.run_category_body(category).await;
        self.print_summary();
    }

    async fn run_category_body(&mut self, category: Category) {
        match category {
            Category::Startup => self.test_startup().await,
            Category::Vehicles => self.test_vehicles().await,
            Category::Search => self.test_search().await,
            Category::ChekChart => self.test_chek_chart().await,
            Category::Content => self.test_content().await,
            Category::Common => self.test_list("📚 COMMON CONTENT TESTS", &COMMON_ENDPOINTS).await,
            Category::Commercial => {
                self.test_list("🚛 COMMERCIAL PARTS TESTS", &COMMERCIAL_ENDPOINTS)
                    .await
            }
        }
    }

    /// Calls one endpoint, records and prints the result
    ///
    /// Returns the decoded body of a successful JSON response so callers can
    /// pick identifiers out of it without a second request.
    async fn test(&mut self, path: &str, description: &str) -> (TestStatus, Option<Value>) {
        let mut result = TestResult::new(path);
        let mut payload = None;

        match self.probe.endpoints().path(path) {
            Err(e) => result.error = e.to_string(),
            Ok(url) => {
                let start = Instant::now();
                match self.probe.get(&url).await {
                    Ok(response) => {
                        result.duration_ms = start.elapsed().as_millis() as u64;
                        result.http_code = Some(response.status.as_u16());
                        result.response_size = response.body.len();

                        let (status, error) = TestStatus::from_http(response.status);
                        result.status = status;
                        result.error = error;

                        if status == TestStatus::Success {
                            match response.json() {
                                Ok(value) => {
                                    result.sample = sample_of(&value);
                                    payload = Some(value);
                                }
                                Err(_) => {
                                    result.sample = response.text().chars().take(100).collect()
                                }
                            }
                        }
                    }
                    Err(e) => {
                        result.status = TestStatus::Error;
                        result.error = match e {
                            crate::api::FetchError::Timeout { .. } => "Timeout".to_string(),
                            other => other.to_string().chars().take(50).collect(),
                        };
                    }
                }
            }
        }

        print_result(&result, description);
        let status = result.status;
        self.results.push(result);
        (status, payload)
    }

    // ========== CATEGORY: STARTUP ==========
    async fn test_startup(&mut self) {
        print_section("🧪 STARTUP TESTS");
        self.test("/HelloWorld", "API Hello World").await;
    }

    // ========== CATEGORY: VEHICLES ==========
    async fn test_vehicles(&mut self) {
        print_section("🚗 VEHICLE TESTS");

        let (_, years) = self.test("/Information/YMME/Years", "Get years").await;
        if let Some(latest) = years
            .as_ref()
            .and_then(ymme_body)
            .and_then(Value::as_array)
            .and_then(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry.get("Year").and_then(Value::as_i64))
                    .max()
            })
        {
            self.ids.year = latest;
            println!("    → Latest year: {}", latest);
        }

        let year = self.ids.year;
        let (_, makes) = self
            .test(
                &format!("/Information/YMME/Years/{}/Makes", year),
                &format!("Get makes for {}", year),
            )
            .await;
        if let Some(make) = makes.as_ref().and_then(first_body_item) {
            self.ids.make_id = id_field(make, "MakeID");
            if let Some(make_id) = &self.ids.make_id {
                println!("    → Found make ID: {} ({})", make_id, name_of(make, "MakeName"));
            }
        }

        if let Some(make_id) = self.ids.make_id.clone() {
            let models_path = format!("/Information/YMME/Years/{}/Makes/{}/Models", year, make_id);
            let (_, models) = self.test(&models_path, "Get models").await;
            if let Some(model) = models.as_ref().and_then(first_body_item) {
                self.ids.model_id = id_field(model, "ModelID");
                if let Some(model_id) = &self.ids.model_id {
                    println!(
                        "    → Found model ID: {} ({})",
                        model_id,
                        name_of(model, "ModelName")
                    );
                }
            }

            if let Some(model_id) = self.ids.model_id.clone() {
                let model_path = format!("{}/{}", models_path, model_id);
                self.test(&format!("{}/Engines", model_path), "Get engines")
                    .await;

                let (_, vehicles) = self
                    .test(&format!("{}/Vehicles", model_path), "Get vehicles")
                    .await;
                if let Some(vehicle) = vehicles.as_ref().and_then(first_body_item) {
                    self.ids.base_vehicle_id = id_field(vehicle, "BaseVehicleID");
                    self.ids.vehicle_id = id_field(vehicle, "VehicleID");
                    println!(
                        "    → Found BaseVehicle: {}, Vehicle: {}",
                        self.ids.base_vehicle_id.as_deref().unwrap_or("0"),
                        self.ids.vehicle_id.as_deref().unwrap_or("0")
                    );
                }

                self.test(&format!("{}/BaseVehicle", model_path), "Get base vehicle")
                    .await;
            }
        }

        self.test("/Information/Vehicles/Types", "Get vehicle types")
            .await;
        self.test("/Information/Vehicles/Trailers", "Get trailers")
            .await;
    }

    // ========== CATEGORY: VEHICLE SEARCH ==========
    async fn test_search(&mut self) {
        print_section("🔍 VEHICLE SEARCH TESTS");

        self.test(
            "/Information/Vehicles/Search/ByVIN?VIN=1HGBH41JXMN109186",
            "Search by VIN",
        )
        .await;
        self.test(
            "/Information/Vehicles/Search/ByTerm?searchTerm=2024+Ford+F-150",
            "Search by term",
        )
        .await;
    }

    // ========== CATEGORY: CHEK-CHART ==========
    async fn test_chek_chart(&mut self) {
        print_section("📊 CHEK-CHART TESTS");

        let (_, years) = self
            .test("/Information/Chek-Chart/Years", "Get Chek-Chart years")
            .await;
        let Some(first) = years.as_ref().and_then(first_body_item) else {
            return;
        };
        let year = first
            .get("Year")
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_YEAR);

        let (_, makes) = self
            .test(
                &format!("/Information/Chek-Chart/Years/{}/Makes", year),
                &format!("Get makes for {}", year),
            )
            .await;
        let Some(make) = makes.as_ref().and_then(first_body_item) else {
            return;
        };

        let make_code = make
            .get("MakeCode")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        self.test(
            &format!(
                "/Information/Chek-Chart/Years/{}/Makes/{}/Models",
                year, make_code
            ),
            "Get models",
        )
        .await;
    }

    // ========== CATEGORY: CONTENT BY VEHICLE ==========
    async fn test_content(&mut self) {
        let Some(base_vehicle_id) = self.ids.base_vehicle_id.clone() else {
            println!("\n⚠️ Skipping content tests - no vehicle ID found");
            return;
        };

        let base_path = format!(
            "/Information/Vehicles/Attributes/BaseVehicle/{}",
            base_vehicle_id
        );

        for (content_type, marker) in CONTENT_TYPES {
            println!("\n{} {}", marker, content_type.to_uppercase());
            println!("{}", "-".repeat(40));

            let kind = if content_type == "VehicleImages" {
                "Details"
            } else {
                "Summaries"
            };
            let summary_path = format!("{}/Content/{}/Of/{}", base_path, kind, content_type);
            let (_, summary) = self
                .test(&summary_path, &format!("Get {} summary", content_type))
                .await;

            let application_id = summary
                .as_ref()
                .and_then(ymme_body)
                .and_then(|body| body.get("Applications"))
                .and_then(Value::as_array)
                .and_then(|apps| apps.first())
                .and_then(|app| id_field(app, "ApplicationID"));

            if let Some(app_id) = application_id {
                self.ids
                    .application_ids
                    .insert(content_type, app_id.clone());
                self.test(
                    &format!(
                        "{}/Content/Details/Of/{}/{}",
                        base_path, content_type, app_id
                    ),
                    &format!("Get {} detail [{}]", content_type, app_id),
                )
                .await;
            }

            if content_type != "VehicleImages" && content_type != "RecommendedFluids" {
                self.test(
                    &format!("{}/Content/Taxonomies/Of/{}", base_path, content_type),
                    &format!("Get {} taxonomy", content_type),
                )
                .await;
            }
        }
    }

    // ========== CATEGORY: COMMON / COMMERCIAL ==========
    async fn test_list(&mut self, title: &str, endpoints: &[(&str, &str)]) {
        print_section(title);
        for (path, description) in endpoints {
            self.test(path, description).await;
        }
    }

    fn print_banner(&self, title: &str, with_time: bool) {
        println!("\n{}", "=".repeat(RULE_WIDTH));
        println!("{}", title);
        println!("   Proxy: {}", self.probe.endpoints().base());
        if with_time {
            println!("   Time: {}", Local::now().to_rfc3339());
        }
        println!("{}", "=".repeat(RULE_WIDTH));
    }

    /// Prints per-status totals and the mean latency of successful calls
    pub fn print_summary(&self) {
        print_section("📊 TEST SUMMARY");

        let total = self.results.len();
        let count = |status: TestStatus| self.results.iter().filter(|r| r.status == status).count();
        let success = count(TestStatus::Success);

        println!("  ✅ Success: {}/{}", success, total);
        println!("  ❌ Failed:  {}/{}", count(TestStatus::Fail), total);
        println!("  🔐 Auth:    {}/{}", count(TestStatus::Auth), total);
        println!("  💥 Error:   {}/{}", count(TestStatus::Error), total);

        if let Some(avg) = average_success_ms(&self.results) {
            println!("\n  ⏱️ Avg response time: {:.0}ms", avg);
        }
    }

    /// Writes `test_results_YYYYmmdd_HHMMSS.json` into `dir`
    pub fn save_results(&self, dir: &Path) -> Result<PathBuf> {
        let file_name = Local::now()
            .format("test_results_%Y%m%d_%H%M%S.json")
            .to_string();
        let path = dir.join(file_name);

        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, &self.results).map_err(std::io::Error::from)?;

        println!("\n  📁 Results saved to: {}", path.display());
        Ok(path)
    }
}

/// Mean duration of successful calls, `None` when there were none
pub fn average_success_ms(results: &[TestResult]) -> Option<f64> {
    let durations: Vec<u64> = results
        .iter()
        .filter(|r| r.status == TestStatus::Success)
        .map(|r| r.duration_ms)
        .collect();

    if durations.is_empty() {
        return None;
    }
    Some(durations.iter().sum::<u64>() as f64 / durations.len() as f64)
}

fn sample_of(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().take(5).map(String::as_str).collect();
            format!("{:?}", keys)
        }
        Value::Array(items) => format!("[{} items]", items.len()),
        other => other.to_string().chars().take(100).collect(),
    }
}

fn name_of<'a>(object: &'a Value, key: &str) -> &'a str {
    object.get(key).and_then(Value::as_str).unwrap_or("Unknown")
}

fn print_section(title: &str) {
    println!("\n{}", "=".repeat(RULE_WIDTH));
    println!("{}", title);
    println!("{}", "=".repeat(RULE_WIDTH));
}

fn format_result_line(result: &TestResult, description: &str) -> String {
    let code = result
        .http_code
        .map(|c| format!("[{}]", c))
        .unwrap_or_else(|| "[---]".to_string());
    let time = if result.duration_ms > 0 {
        format!("{}ms", result.duration_ms)
    } else {
        String::new()
    };
    let size = if result.response_size > 0 {
        format!("({}B)", result.response_size)
    } else {
        String::new()
    };
    let endpoint: String = result.endpoint.chars().take(ENDPOINT_COLUMN).collect();

    let mut line = format!(
        "{} {:6} {} {:width$} {:>8} {}",
        result.status.marker(),
        result.method,
        code,
        endpoint,
        time,
        size,
        width = ENDPOINT_COLUMN
    );
    if !description.is_empty() {
        line.push_str(&format!(" | {}", description));
    }
    if !result.error.is_empty() {
        line.push_str(&format!(" | ⚠️ {}", result.error));
    }
    line
}

fn print_result(result: &TestResult, description: &str) {
    println!("{}", format_result_line(result, description));
}

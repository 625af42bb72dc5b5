//! Diagnostic probes against the vehicle-data proxy
//!
//! These are console tools for checking the remote API by hand:
//! - `interval`: which maintenance-interval type the API accepts
//! - `compliance`: whether content endpoints carry their expected list property
//! - `endpoint_tester`: a categorised sweep over the documented endpoints
//!
//! Probes issue one request at a time and print their findings to stdout.

pub mod compliance;
pub mod endpoint_tester;
pub mod interval;

pub use compliance::{run_compliance, ComplianceReport};
pub use endpoint_tester::{Category, EndpointTester, TestResult, TestStatus};
pub use interval::{probe_interval_types, IntervalAttempt, INTERVAL_TYPES};

use crate::api::{ApiClient, Endpoints, FetchError, RawResponse};
use crate::config::ProbeConfig;
use crate::Result;
use serde_json::Value;
use url::Url;

/// Characters of an undecodable body shown in diagnostics
const PREVIEW_CHARS: usize = 200;

/// HTTP client and URL builder shared by the probes
pub struct ProbeClient {
    client: ApiClient,
    endpoints: Endpoints,
    content_source: String,
}

impl ProbeClient {
    /// Builds a client for the configured probe base URL
    pub fn new(config: &ProbeConfig) -> Result<Self> {
        Self::with_base_url(config, &config.base_url)
    }

    /// Builds a client for an explicit base URL, keeping the other probe settings
    pub fn with_base_url(config: &ProbeConfig, base_url: &str) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(&config.http_settings())?,
            endpoints: Endpoints::new(base_url)?,
            content_source: config.content_source.clone(),
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// `{base}/source/{source}/vehicle/{vehicle_id}/{route…}`
    pub fn vehicle_route(&self, vehicle_id: &str, route: &[&str]) -> Url {
        let mut segments = vec!["source", self.content_source.as_str(), "vehicle", vehicle_id];
        segments.extend_from_slice(route);
        self.endpoints.segments(&segments)
    }

    /// `{base}/Information/YMME/{route…}`
    pub fn ymme_route(&self, route: &[&str]) -> Url {
        let mut segments = vec!["Information", "YMME"];
        segments.extend_from_slice(route);
        self.endpoints.segments(&segments)
    }

    /// Sends a GET, reporting the response whatever its status
    pub async fn get(&self, url: &Url) -> std::result::Result<RawResponse, FetchError> {
        self.client.get(url).await
    }

    /// Sends a GET and decodes the JSON body, printing any failure
    pub async fn get_json(&self, url: &Url) -> Option<Value> {
        let response = match self.client.get(url).await {
            Ok(response) => response,
            Err(e) => {
                println!("❌ Request Failed: {}", e);
                return None;
            }
        };

        if !response.status.is_success() {
            println!(
                "❌ HTTP Error {}: {}",
                response.status.as_u16(),
                response.status.canonical_reason().unwrap_or("Unknown")
            );
            return None;
        }

        match response.json() {
            Ok(value) => Some(value),
            Err(_) => {
                let preview: String = response.text().chars().take(PREVIEW_CHARS).collect();
                println!("❌ JSON Decode Error. Content preview: {}", preview);
                None
            }
        }
    }
}

/// Whether a decoded payload carries anything at all
///
/// Null, `false`, zero, and empty strings, arrays or objects count as no data.
pub(crate) fn has_data(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Reads an identifier field as a string; absent, null, zero and empty are `None`
pub(crate) fn id_field(object: &Value, key: &str) -> Option<String> {
    object
        .get(key)
        .filter(|value| has_data(value))
        .and_then(|value| match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// The capitalised `Body` envelope of the YMME routes, when non-empty
pub(crate) fn ymme_body(value: &Value) -> Option<&Value> {
    value.get("Body").filter(|body| has_data(body))
}

/// The first element of a `Body` list, or the body itself when it is an object
pub(crate) fn first_body_item(value: &Value) -> Option<&Value> {
    match ymme_body(value)? {
        Value::Array(items) => items.first(),
        object @ Value::Object(_) => Some(object),
        _ => None,
    }
}

use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str =
    "https://motorproxy-erohrfg7qa-uc.a.run.app/api/motor-proxy/api";
pub const DEFAULT_PROBE_BASE_URL: &str = "https://autolib.web.app/api/motor-proxy/api";
pub const DEFAULT_DIRECT_URL: &str = "https://sites.motor.com/m1/api";

/// Main configuration structure for vehicle-db
///
/// Every section is optional in the TOML file; missing sections and keys fall
/// back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
    pub probe: ProbeConfig,
}

/// Upstream API used by the populate crawl
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every crawl endpoint is appended to
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Total timeout for a single request (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Skip TLS certificate verification
    ///
    /// Off by default, so certificates are verified. A proxy behind a
    /// self-signed certificate needs `accept-invalid-certs = true`.
    #[serde(rename = "accept-invalid-certs")]
    pub accept_invalid_certs: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 30,
            user_agent: "VehicleDBPopulator/1.0".to_string(),
            accept_invalid_certs: false,
        }
    }
}

impl ApiConfig {
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of in-flight upstream requests, system-wide
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 10,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the populate log file
    #[serde(rename = "log-path")]
    pub log_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "vehicles.db".to_string(),
            log_path: "populate_db.log".to_string(),
        }
    }
}

/// Settings shared by the diagnostic probes
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Direct MOTOR endpoint, used by `endpoints --direct`
    #[serde(rename = "direct-url")]
    pub direct_url: String,

    #[serde(rename = "content-source")]
    pub content_source: String,

    /// Vehicle ID used when discovery cannot walk the YMME tree
    #[serde(rename = "fallback-vehicle-id")]
    pub fallback_vehicle_id: String,

    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Same as `[api] accept-invalid-certs`; off unless set
    #[serde(rename = "accept-invalid-certs")]
    pub accept_invalid_certs: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROBE_BASE_URL.to_string(),
            direct_url: DEFAULT_DIRECT_URL.to_string(),
            content_source: "MOTOR".to_string(),
            fallback_vehicle_id: "188569:13820".to_string(),
            timeout_secs: 30,
            user_agent: "Mozilla/5.0".to_string(),
            accept_invalid_certs: false,
        }
    }
}

impl ProbeConfig {
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }
}

/// Client-level HTTP settings, resolved from a config section
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: String,
    pub accept_invalid_certs: bool,
}

//! vehicle-db: a local mirror of the MOTOR year/make/model/engine hierarchy
//!
//! This crate crawls a vehicle-data REST proxy with bounded concurrency and
//! stores the hierarchy in SQLite, resuming per year across runs. It also
//! ships a handful of diagnostic probes for checking the remote API by hand.

pub mod api;
pub mod config;
pub mod crawler;
pub mod output;
pub mod probe;
pub mod storage;

use thiserror::Error;

/// Main error type for vehicle-db operations
#[derive(Debug, Error)]
pub enum VehicleDbError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Storage lock poisoned by a panicked task")]
    StorageLock,

    #[error("Failed to fetch the list of years from {url}")]
    YearsUnavailable { url: String },

    #[error("Could not obtain a vehicle ID for probing")]
    VehicleIdUnavailable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-building errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("URL cannot carry path segments: {0}")]
    CannotBeABase(String),
}

/// Result type alias for vehicle-db operations
pub type Result<T> = std::result::Result<T, VehicleDbError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use api::{Endpoints, FailureLog, Fetcher, HttpFetcher};
pub use config::Config;
pub use crawler::{CrawlReport, Crawler, YearOutcome};
pub use storage::{SqliteStorage, Storage, YearStatus};

//! Configuration module for vehicle-db
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Running without a file is the normal case: the defaults point at the
//! production proxy with a ceiling of 10 in-flight requests.
//!
//! # Example
//!
//! ```no_run
//! use vehicle_db::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("vehicle-db.toml")).unwrap();
//! println!("Database: {}", config.output.database_path);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    ApiConfig, Config, CrawlerConfig, HttpSettings, OutputConfig, ProbeConfig,
    DEFAULT_API_BASE_URL, DEFAULT_DIRECT_URL, DEFAULT_PROBE_BASE_URL,
};

pub use parser::{load_config, load_config_or_default};
pub use validation::validate;

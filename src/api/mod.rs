//! Access to the upstream vehicle-data proxy
//!
//! This module contains:
//! - URL construction beneath the configured base URL
//! - The reqwest-backed HTTP client and its error classification
//! - The `Fetcher` contract used by the crawl (value or absence, never an error)
//! - Typed views of the crawl payloads

mod client;
mod endpoints;
mod fetcher;
pub mod payload;

pub use client::{ApiClient, FetchError, RawResponse, ERROR_SNIPPET_CHARS};
pub use endpoints::Endpoints;
pub use fetcher::{unwrap_envelope, FailureLog, Fetcher, HttpFetcher, ENVELOPE_FIELD};
pub use payload::{parse_makes, parse_models, parse_years, ApiEngine, ApiMake, ApiModel};

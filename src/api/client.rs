//! HTTP client for the vehicle-data proxy
//!
//! This module handles all raw HTTP traffic:
//! - Building the reqwest client from resolved `HttpSettings`
//! - Plain GETs that report any status (used by the probes)
//! - JSON GETs that accept only HTTP 200 (used by the crawl)
//! - Error classification into `FetchError`

use crate::config::HttpSettings;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// Longest slice of an error response body kept for diagnostics
pub const ERROR_SNIPPET_CHARS: usize = 500;

/// Why a request produced no usable value
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Timeout fetching {url}")]
    Timeout { url: String },

    #[error("Client error fetching {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Failed to fetch {url}: Status {status}, Response: {snippet}")]
    Status {
        url: String,
        status: u16,
        snippet: String,
    },

    #[error("Malformed JSON from {url}: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::Transport { url, .. }
            | Self::Status { url, .. }
            | Self::Decode { url, .. } => url,
        }
    }

    fn from_reqwest(url: &Url, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// A response read to completion, whatever its status
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
    pub elapsed: Duration,
}

impl RawResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Thin wrapper around a shared reqwest client
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    /// Builds an HTTP client with the given settings
    ///
    /// # Arguments
    ///
    /// * `settings` - Timeout, user agent and TLS policy
    ///
    /// # Returns
    ///
    /// * `Ok(ApiClient)` - Successfully built HTTP client
    /// * `Err(reqwest::Error)` - Failed to build client
    pub fn new(settings: &HttpSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }

    /// Sends a GET and reads the body, whatever the status code
    pub async fn get(&self, url: &Url) -> Result<RawResponse, FetchError> {
        let start = Instant::now();

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
            elapsed: start.elapsed(),
        })
    }

    /// Sends a GET and parses the body as JSON
    ///
    /// Only HTTP 200 counts as success. Any other status becomes
    /// `FetchError::Status` carrying the first 500 characters of the body.
    pub async fn get_json(&self, url: &Url) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let snippet = match response.text().await {
                Ok(text) => text.chars().take(ERROR_SNIPPET_CHARS).collect(),
                Err(e) => {
                    tracing::warn!("Could not read response text for {}: {}", url, e);
                    String::new()
                }
            };
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                snippet,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

//! The crawl's fetch contract
//!
//! `Fetcher::fetch` never fails: it yields the (envelope-unwrapped) JSON
//! value or `None`. Every failure is written to the log and recorded in a
//! `FailureLog` handed in at construction.

use crate::api::client::{ApiClient, FetchError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use url::Url;

/// Name of the optional wrapper field around proxy payloads
pub const ENVELOPE_FIELD: &str = "body";

/// Source of JSON payloads for the crawl
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url`, returning the unwrapped JSON value or `None` on any failure
    async fn fetch(&self, url: &Url) -> Option<Value>;
}

/// Returns the `body` field when the value is an object that has one
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) => match map.remove(ENVELOPE_FIELD) {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        other => other,
    }
}

/// Shared sink for fetch failures
///
/// Cheap to clone; all clones append to the same list.
#[derive(Debug, Clone, Default)]
pub struct FailureLog {
    entries: Arc<Mutex<Vec<FetchError>>>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs the failure and keeps it for later inspection
    pub fn record(&self, error: FetchError) {
        tracing::error!("{}", error);
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(error);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<FetchError> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }
}

/// `Fetcher` backed by the real HTTP client
pub struct HttpFetcher {
    client: ApiClient,
    failures: FailureLog,
}

impl HttpFetcher {
    pub fn new(client: ApiClient, failures: FailureLog) -> Self {
        Self { client, failures }
    }

    pub fn failures(&self) -> &FailureLog {
        &self.failures
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Option<Value> {
        tracing::debug!("GET {}", url);
        match self.client.get_json(url).await {
            Ok(value) => Some(unwrap_envelope(value)),
            Err(error) => {
                self.failures.record(error);
                None
            }
        }
    }
}

//! Upstream payload shapes for the crawl endpoints
//!
//! Only presence is checked. Lists are read item by item: an entry missing a
//! field the crawl needs is logged and skipped, and its siblings are kept.

use serde::de::DeserializeOwned;
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("expected a JSON array of years, got {0}")]
    NotAYearList(&'static str),

    #[error("unrecognised year identifier: {0}")]
    BadYear(String),

    #[error("expected a JSON array, got {0}")]
    NotAnArray(&'static str),
}

/// One entry of `GET /year/{year}/makes`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMake {
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub make_id: i64,
    pub make_name: String,
}

/// One entry of the `models` array of `GET /year/{year}/make/{name}/models`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiModel {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_engines")]
    pub engines: Vec<ApiEngine>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiEngine {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Vendor identifiers are strings, but some routes emit bare numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number identifier, got {}",
            json_kind(&other)
        ))),
    }
}

/// Make ids are numeric, sometimes sent as strings
fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| de::Error::custom(format!("expected a numeric id, got {}", value)))
}

/// A missing or null `engines` field means no engines
fn lenient_engines<'de, D>(deserializer: D) -> Result<Vec<ApiEngine>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(parse_items(&items, "engine"))
}

/// Deserializes each entry on its own, dropping the ones that do not fit
fn parse_items<T: DeserializeOwned>(items: &[Value], what: &str) -> Vec<T> {
    items
        .iter()
        .filter_map(|item| match T::deserialize(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Skipping {} entry {}: {}", what, item, e);
                None
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parses the years list: numbers or numeric strings
pub fn parse_years(value: &Value) -> Result<Vec<i32>, PayloadError> {
    let items = value
        .as_array()
        .ok_or(PayloadError::NotAYearList(json_kind(value)))?;

    items
        .iter()
        .map(|item| {
            let parsed = match item {
                Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
                Value::String(s) => s.trim().parse::<i32>().ok(),
                _ => None,
            };
            parsed.ok_or_else(|| PayloadError::BadYear(item.to_string()))
        })
        .collect()
}

/// Parses the makes list of one year
///
/// Fails only when the payload is not a list; unusable entries are skipped.
pub fn parse_makes(value: &Value) -> Result<Vec<ApiMake>, PayloadError> {
    let items = value
        .as_array()
        .ok_or(PayloadError::NotAnArray(json_kind(value)))?;
    Ok(parse_items(items, "make"))
}

/// Parses a models response
///
/// Returns `None` when the payload has no `models` field at all; the crawl
/// skips such makes without logging.
pub fn parse_models(value: &Value) -> Option<Result<Vec<ApiModel>, PayloadError>> {
    let models = value.get("models")?;
    Some(match models.as_array() {
        Some(items) => Ok(parse_items(items, "model")),
        None => Err(PayloadError::NotAnArray(json_kind(models))),
    })
}

//! Storage module for persisting the vehicle hierarchy
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Per-year crawl status (the resume marker)
//! - Make, model and engine upserts

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::VehicleDbError;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Storage handle shared by every crawl task
///
/// The lock is only taken around synchronous statement execution.
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// Opens (or creates) the database and wraps it for sharing
pub fn open_shared_storage(path: &Path) -> Result<SharedStorage, VehicleDbError> {
    let storage = SqliteStorage::new(path)?;
    Ok(Arc::new(Mutex::new(storage)))
}

/// Crawl status of a model year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YearStatus {
    Pending,
    Completed,
}

impl YearStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for YearStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Represents a year row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearRecord {
    pub year: i32,
    pub status: YearStatus,
}

/// Represents a make row, keyed by (make_id, year)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeRecord {
    pub make_id: i64,
    pub name: String,
    pub year: i32,
}

/// Represents a model row, keyed by the vendor's vehicle ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRecord {
    pub vehicle_id: String,
    /// NULL when the upstream entry carries no name
    pub name: Option<String>,
    pub year: i32,
    pub make_id: i64,
    pub make_name: String,
}

/// Represents an engine row, keyed by the vendor's engine ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRecord {
    pub engine_id: String,
    pub vehicle_id: String,
    pub name: Option<String>,
}

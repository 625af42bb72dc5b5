//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{EngineRecord, MakeRecord, ModelRecord, YearRecord, YearStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Unknown year status '{0}' in database")]
    UnknownStatus(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every write replaces rows on key conflict; nothing is ever deleted.
/// Implementations are shared behind a mutex and must be `Send`.
pub trait Storage {
    // ===== Years =====

    /// Inserts the year as pending if it is not already present
    ///
    /// An existing row keeps its status.
    fn ensure_year(&mut self, year: i32) -> StorageResult<()>;

    /// Gets the status of a year, `None` if it has no row
    fn year_status(&self, year: i32) -> StorageResult<Option<YearStatus>>;

    /// Marks a year as completed
    fn mark_year_completed(&mut self, year: i32) -> StorageResult<()>;

    /// Lists every year, newest first
    fn list_years(&self) -> StorageResult<Vec<YearRecord>>;

    // ===== Hierarchy writes =====

    /// Upserts the makes of one year in a single transaction
    fn upsert_makes(&mut self, makes: &[MakeRecord]) -> StorageResult<()>;

    /// Upserts models and their engines in a single transaction, models first
    fn upsert_models(
        &mut self,
        models: &[ModelRecord],
        engines: &[EngineRecord],
    ) -> StorageResult<()>;

    // ===== Hierarchy reads =====

    fn makes_for_year(&self, year: i32) -> StorageResult<Vec<MakeRecord>>;

    fn models_for_make(&self, year: i32, make_id: i64) -> StorageResult<Vec<ModelRecord>>;

    fn engines_for_model(&self, vehicle_id: &str) -> StorageResult<Vec<EngineRecord>>;

    // ===== Statistics =====

    fn count_years_by_status(&self, status: YearStatus) -> StorageResult<u64>;

    fn count_makes(&self) -> StorageResult<u64>;

    fn count_models(&self) -> StorageResult<u64>;

    fn count_engines(&self) -> StorageResult<u64>;
}

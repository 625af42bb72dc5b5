//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{EngineRecord, MakeRecord, ModelRecord, YearRecord, YearStatus};
use crate::VehicleDbError;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(VehicleDbError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, VehicleDbError> {
        Self::configure(Connection::open(path)?)
    }

    /// Opens a database file that must already exist
    ///
    /// Unlike [`SqliteStorage::new`], a missing file is an error rather than
    /// a fresh empty database.
    pub fn open_existing(path: &Path) -> Result<Self, VehicleDbError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Self::configure(Connection::open_with_flags(path, flags)?)
    }

    fn configure(conn: Connection) -> Result<Self, VehicleDbError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> Result<Self, VehicleDbError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl Storage for SqliteStorage {
    // ===== Years =====

    fn ensure_year(&mut self, year: i32) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO years (year, status) VALUES (?1, ?2) ON CONFLICT(year) DO NOTHING",
            params![year, YearStatus::Pending.to_db_string()],
        )?;
        Ok(())
    }

    fn year_status(&self, year: i32) -> StorageResult<Option<YearStatus>> {
        let status: Option<String> = self
            .conn
            .query_row(
                "SELECT status FROM years WHERE year = ?1",
                params![year],
                |row| row.get(0),
            )
            .optional()?;

        status
            .map(|s| YearStatus::from_db_string(&s).ok_or(StorageError::UnknownStatus(s)))
            .transpose()
    }

    fn mark_year_completed(&mut self, year: i32) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE years SET status = ?1 WHERE year = ?2",
            params![YearStatus::Completed.to_db_string(), year],
        )?;
        Ok(())
    }

    fn list_years(&self) -> StorageResult<Vec<YearRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT year, status FROM years ORDER BY year DESC")?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i32>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(year, status)| {
                let status =
                    YearStatus::from_db_string(&status).ok_or(StorageError::UnknownStatus(status))?;
                Ok(YearRecord { year, status })
            })
            .collect()
    }

    // ===== Hierarchy writes =====

    fn upsert_makes(&mut self, makes: &[MakeRecord]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO makes (id, name, year) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id, year) DO UPDATE SET name = excluded.name",
            )?;
            for make in makes {
                stmt.execute(params![make.make_id, make.name, make.year])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn upsert_models(
        &mut self,
        models: &[ModelRecord],
        engines: &[EngineRecord],
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO models (id, name, year, make_id, make_name) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    year = excluded.year,
                    make_id = excluded.make_id,
                    make_name = excluded.make_name",
            )?;
            for model in models {
                stmt.execute(params![
                    model.vehicle_id,
                    model.name,
                    model.year,
                    model.make_id,
                    model.make_name
                ])?;
            }
        }
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO engines (id, vehicle_id, name) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET
                    vehicle_id = excluded.vehicle_id,
                    name = excluded.name",
            )?;
            for engine in engines {
                stmt.execute(params![engine.engine_id, engine.vehicle_id, engine.name])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ===== Hierarchy reads =====

    fn makes_for_year(&self, year: i32) -> StorageResult<Vec<MakeRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, year FROM makes WHERE year = ?1 ORDER BY id")?;

        let makes = stmt
            .query_map(params![year], |row| {
                Ok(MakeRecord {
                    make_id: row.get(0)?,
                    name: row.get(1)?,
                    year: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(makes)
    }

    fn models_for_make(&self, year: i32, make_id: i64) -> StorageResult<Vec<ModelRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, year, make_id, make_name FROM models
             WHERE year = ?1 AND make_id = ?2 ORDER BY id",
        )?;

        let models = stmt
            .query_map(params![year, make_id], |row| {
                Ok(ModelRecord {
                    vehicle_id: row.get(0)?,
                    name: row.get(1)?,
                    year: row.get(2)?,
                    make_id: row.get(3)?,
                    make_name: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(models)
    }

    fn engines_for_model(&self, vehicle_id: &str) -> StorageResult<Vec<EngineRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, vehicle_id, name FROM engines WHERE vehicle_id = ?1 ORDER BY id",
        )?;

        let engines = stmt
            .query_map(params![vehicle_id], |row| {
                Ok(EngineRecord {
                    engine_id: row.get(0)?,
                    vehicle_id: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(engines)
    }

    // ===== Statistics =====

    fn count_years_by_status(&self, status: YearStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM years WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_makes(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM makes")
    }

    fn count_models(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM models")
    }

    fn count_engines(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM engines")
    }
}

//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the vehicle database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Crawl progress marker, one row per model year
CREATE TABLE IF NOT EXISTS years (
    year INTEGER PRIMARY KEY,
    status TEXT NOT NULL DEFAULT 'pending'
);

CREATE INDEX IF NOT EXISTS idx_years_status ON years(status);

-- Makes offered in a given year
CREATE TABLE IF NOT EXISTS makes (
    id INTEGER NOT NULL,
    name TEXT,
    year INTEGER NOT NULL,
    PRIMARY KEY (id, year)
);

CREATE INDEX IF NOT EXISTS idx_makes_year ON makes(year);

-- Models keyed by the vendor's vehicle ID; make name is denormalized
CREATE TABLE IF NOT EXISTS models (
    id TEXT PRIMARY KEY,
    name TEXT,
    year INTEGER,
    make_id INTEGER,
    make_name TEXT
);

CREATE INDEX IF NOT EXISTS idx_models_year ON models(year);
CREATE INDEX IF NOT EXISTS idx_models_make_id ON models(make_id);

-- Engines keyed by the vendor's engine ID
CREATE TABLE IF NOT EXISTS engines (
    id TEXT PRIMARY KEY,
    vehicle_id TEXT REFERENCES models(id),
    name TEXT
);

CREATE INDEX IF NOT EXISTS idx_engines_vehicle_id ON engines(vehicle_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

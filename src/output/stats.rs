//! Statistics generation from the vehicle database
//!
//! This module provides functionality for extracting and displaying
//! populate progress and row counts from the storage layer.

use crate::storage::{Storage, YearStatus};
use crate::Result;

/// Database statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseStatistics {
    /// Number of years marked completed
    pub years_completed: u64,

    /// Number of years still pending
    pub years_pending: u64,

    /// Pending years, newest first
    pub pending_years: Vec<i32>,

    pub makes: u64,
    pub models: u64,
    pub engines: u64,
}

impl DatabaseStatistics {
    pub fn total_years(&self) -> u64 {
        self.years_completed + self.years_pending
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(DatabaseStatistics)` - Successfully loaded statistics
/// * `Err(VehicleDbError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<DatabaseStatistics> {
    let pending_years = storage
        .list_years()?
        .into_iter()
        .filter(|record| record.status == YearStatus::Pending)
        .map(|record| record.year)
        .collect();

    Ok(DatabaseStatistics {
        years_completed: storage.count_years_by_status(YearStatus::Completed)?,
        years_pending: storage.count_years_by_status(YearStatus::Pending)?,
        pending_years,
        makes: storage.count_makes()?,
        models: storage.count_models()?,
        engines: storage.count_engines()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &DatabaseStatistics) {
    println!("=== Vehicle Database Statistics ===\n");

    println!("Years:");
    println!("  Total: {}", stats.total_years());
    println!("  Completed: {}", stats.years_completed);
    println!("  Pending: {}", stats.years_pending);
    if !stats.pending_years.is_empty() {
        let pending: Vec<String> = stats.pending_years.iter().map(|y| y.to_string()).collect();
        println!("  Pending years: {}", pending.join(", "));
    }
    println!();

    println!("Rows:");
    println!("  Makes: {}", stats.makes);
    println!("  Models: {}", stats.models);
    println!("  Engines: {}", stats.engines);
    println!();

    let completion = if stats.total_years() > 0 {
        (stats.years_completed as f64 / stats.total_years() as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Completion: {:.1}% ({} / {} years populated)",
        completion,
        stats.years_completed,
        stats.total_years()
    );
}

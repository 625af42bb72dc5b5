//! Output module for reporting on the vehicle database
//!
//! This module handles reading populate progress and row counts back out of
//! storage for the `stats` subcommand.

pub mod stats;

pub use stats::{load_statistics, print_statistics, DatabaseStatistics};

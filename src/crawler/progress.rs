//! Populate progress reporting.
//!
//! One event per finished year, in completion order. Progress goes to
//! **stderr** so stdout stays free for the final summary.

use crate::crawler::YearOutcome;
use std::io::Write;

/// Receives a notification each time a year task finishes.
pub trait ProgressReporter: Send + Sync {
    /// `finished` counts years done so far (including this one) out of `total`.
    fn year_finished(&self, finished: usize, total: usize, year: i32, outcome: &YearOutcome);
}

/// Human-friendly progress on stderr: "[ 3/27] 2022  completed (41 makes, ...)".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn year_finished(&self, finished: usize, total: usize, year: i32, outcome: &YearOutcome) {
        let width = total.to_string().len();
        let line = format!(
            "[{:>width$}/{}] {}  {}\n",
            finished,
            total,
            year,
            outcome,
            width = width
        );
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// No-op reporter for quiet runs and tests.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn year_finished(&self, _finished: usize, _total: usize, _year: i32, _outcome: &YearOutcome) {}
}

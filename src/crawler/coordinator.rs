//! Crawler coordinator - main crawl orchestration logic
//!
//! The crawl walks years → makes → models/engines:
//! - One task per year, all started at once
//! - One sub-task per make once the year's makes are stored
//! - A single semaphore bounds in-flight HTTP requests across every task
//! - A year is marked completed only after all of its make sub-tasks finish,
//!   so an interrupted year is retried in full on the next run

use crate::api::{
    parse_makes, parse_models, parse_years, ApiMake, ApiModel, Endpoints, FailureLog, Fetcher,
};
use crate::crawler::progress::ProgressReporter;
use crate::storage::{
    EngineRecord, MakeRecord, ModelRecord, SharedStorage, Storage, StorageResult, YearStatus,
};
use crate::{Result, VehicleDbError};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// How a single year ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearOutcome {
    /// Completed on an earlier run; no requests were made
    AlreadyCompleted,

    /// All make sub-tasks ran and the year is now completed
    Completed {
        makes: usize,
        models: usize,
        engines: usize,
        /// Makes whose models were absent, unfetchable or unstorable
        skipped_makes: usize,
    },

    /// The makes list was unavailable or empty; the year stays pending
    NoMakes,

    /// A store write failed; the year stays pending
    StorageFailed,
}

impl fmt::Display for YearOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyCompleted => write!(f, "already completed"),
            Self::Completed {
                makes,
                models,
                engines,
                skipped_makes,
            } => {
                write!(
                    f,
                    "completed ({} makes, {} models, {} engines",
                    makes, models, engines
                )?;
                if *skipped_makes > 0 {
                    write!(f, ", {} makes skipped", skipped_makes)?;
                }
                write!(f, ")")
            }
            Self::NoMakes => write!(f, "no makes, left pending"),
            Self::StorageFailed => write!(f, "storage failure, left pending"),
        }
    }
}

/// How a single make sub-task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MakeOutcome {
    Stored { models: usize, engines: usize },
    Skipped,
}

/// Totals for one populate run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub years_total: usize,
    pub years_completed: usize,
    pub years_already_completed: usize,
    pub years_pending: usize,
    pub makes: usize,
    pub models: usize,
    pub engines: usize,
    pub skipped_makes: usize,
    /// Failures recorded in the fetcher's `FailureLog` during this run
    pub fetch_failures: usize,
}

impl CrawlReport {
    fn record(&mut self, outcome: &YearOutcome) {
        match outcome {
            YearOutcome::AlreadyCompleted => self.years_already_completed += 1,
            YearOutcome::Completed {
                makes,
                models,
                engines,
                skipped_makes,
            } => {
                self.years_completed += 1;
                self.makes += makes;
                self.models += models;
                self.engines += engines;
                self.skipped_makes += skipped_makes;
            }
            YearOutcome::NoMakes | YearOutcome::StorageFailed => self.years_pending += 1,
        }
    }
}

/// Drives one populate run against a `Fetcher` and a shared store
///
/// Cloning is cheap; clones share the fetcher, the store and the permits.
#[derive(Clone)]
pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    failures: FailureLog,
    storage: SharedStorage,
    endpoints: Arc<Endpoints>,
    permits: Arc<Semaphore>,
}

impl Crawler {
    /// Creates a new crawler
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Source of JSON payloads
    /// * `failures` - The log the fetcher records its failures in
    /// * `storage` - Shared store for the hierarchy
    /// * `endpoints` - URL builder for the upstream API
    /// * `ceiling` - Maximum number of requests in flight at once (at least 1)
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        failures: FailureLog,
        storage: SharedStorage,
        endpoints: Endpoints,
        ceiling: usize,
    ) -> Self {
        Self {
            fetcher,
            failures,
            storage,
            endpoints: Arc::new(endpoints),
            permits: Arc::new(Semaphore::new(ceiling.max(1))),
        }
    }

    /// Runs the crawl to completion
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Every year task finished (some may remain pending)
    /// * `Err(VehicleDbError::YearsUnavailable)` - The years list could not be obtained
    /// * `Err(VehicleDbError)` - The year rows could not be written
    pub async fn run(&self, progress: &dyn ProgressReporter) -> Result<CrawlReport> {
        let failures_before = self.failures.len();

        let years = self.discover_years().await?;
        let total = years.len();
        tracing::info!("Found {} years: {:?}", total, years);

        self.with_storage(|storage| {
            for year in &years {
                storage.ensure_year(*year)?;
            }
            Ok(())
        })?;

        let mut tasks = JoinSet::new();
        for year in years {
            let crawler = self.clone();
            tasks.spawn(async move {
                let outcome = crawler.process_year(year).await;
                (year, outcome)
            });
        }

        let mut report = CrawlReport {
            years_total: total,
            ..CrawlReport::default()
        };
        let mut finished = 0;

        while let Some(joined) = tasks.join_next().await {
            finished += 1;
            match joined {
                Ok((year, outcome)) => {
                    progress.year_finished(finished, total, year, &outcome);
                    report.record(&outcome);
                }
                Err(e) => {
                    tracing::error!("Year task aborted: {}", e);
                    report.years_pending += 1;
                }
            }
        }

        report.fetch_failures = self.failures.len().saturating_sub(failures_before);
        Ok(report)
    }

    /// Fetches the years list, newest first without duplicates
    async fn discover_years(&self) -> Result<Vec<i32>> {
        let url = self.endpoints.years();
        let unavailable = || VehicleDbError::YearsUnavailable {
            url: url.to_string(),
        };

        let value = self.fetch(&url).await.ok_or_else(unavailable)?;

        let mut years = match parse_years(&value) {
            Ok(years) => years,
            Err(e) => {
                tracing::error!("Unexpected years payload from {}: {}", url, e);
                return Err(unavailable());
            }
        };

        if years.is_empty() {
            tracing::error!("Years list from {} is empty", url);
            return Err(unavailable());
        }

        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        Ok(years)
    }

    async fn process_year(&self, year: i32) -> YearOutcome {
        match self.with_storage(|storage| storage.year_status(year)) {
            Ok(Some(YearStatus::Completed)) => {
                tracing::info!("Year {} already completed, skipping", year);
                return YearOutcome::AlreadyCompleted;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Could not read status of year {}: {}", year, e);
                return YearOutcome::StorageFailed;
            }
        }

        tracing::info!("Processing year {}", year);

        let makes = match self.fetch(&self.endpoints.makes(year)).await {
            Some(value) => match parse_makes(&value) {
                Ok(makes) => makes,
                Err(e) => {
                    tracing::warn!("Unexpected makes payload for year {}: {}", year, e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        if makes.is_empty() {
            tracing::warn!("No makes found for year {}", year);
            return YearOutcome::NoMakes;
        }

        let records: Vec<MakeRecord> = makes
            .iter()
            .map(|make| MakeRecord {
                make_id: make.make_id,
                name: make.make_name.clone(),
                year,
            })
            .collect();

        if let Err(e) = self.with_storage(|storage| storage.upsert_makes(&records)) {
            tracing::error!("Error storing makes for year {}: {}", year, e);
            return YearOutcome::StorageFailed;
        }

        let make_count = makes.len();
        let mut tasks = JoinSet::new();
        for make in makes {
            let crawler = self.clone();
            tasks.spawn(async move { crawler.process_make(year, make).await });
        }

        let (mut models, mut engines, mut skipped_makes) = (0, 0, 0);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(MakeOutcome::Stored {
                    models: m,
                    engines: e,
                }) => {
                    models += m;
                    engines += e;
                }
                Ok(MakeOutcome::Skipped) => skipped_makes += 1,
                Err(e) => {
                    tracing::error!("Make task for year {} aborted: {}", year, e);
                    skipped_makes += 1;
                }
            }
        }

        if let Err(e) = self.with_storage(|storage| storage.mark_year_completed(year)) {
            tracing::error!("Error marking year {} completed: {}", year, e);
            return YearOutcome::StorageFailed;
        }

        tracing::info!("Completed year {}", year);
        YearOutcome::Completed {
            makes: make_count,
            models,
            engines,
            skipped_makes,
        }
    }

    async fn process_make(&self, year: i32, make: ApiMake) -> MakeOutcome {
        let url = self.endpoints.models(year, &make.make_name);

        let Some(value) = self.fetch(&url).await else {
            return MakeOutcome::Skipped;
        };

        let models = match parse_models(&value) {
            Some(Ok(models)) => models,
            Some(Err(e)) => {
                tracing::warn!(
                    "Unexpected models payload for year {} make {}: {}",
                    year,
                    make.make_name,
                    e
                );
                return MakeOutcome::Skipped;
            }
            // No `models` field: nothing to store for this make
            None => return MakeOutcome::Skipped,
        };

        let (model_rows, engine_rows) = flatten_models(year, &make, models);

        match self.with_storage(|storage| storage.upsert_models(&model_rows, &engine_rows)) {
            Ok(()) => MakeOutcome::Stored {
                models: model_rows.len(),
                engines: engine_rows.len(),
            },
            Err(e) => {
                tracing::error!(
                    "Error storing models for year {} make {}: {}",
                    year,
                    make.make_name,
                    e
                );
                MakeOutcome::Skipped
            }
        }
    }

    /// Holds one permit for exactly the duration of the request
    async fn fetch(&self, url: &Url) -> Option<Value> {
        // The semaphore is never closed.
        let _permit = self.permits.acquire().await.ok()?;
        self.fetcher.fetch(url).await
    }

    /// Runs synchronous store calls under the lock
    fn with_storage<T>(
        &self,
        f: impl FnOnce(&mut (dyn Storage + Send + 'static)) -> StorageResult<T>,
    ) -> Result<T> {
        let mut storage = self
            .storage
            .lock()
            .map_err(|_| VehicleDbError::StorageLock)?;
        Ok(f(&mut *storage)?)
    }
}

/// Turns one make's models payload into rows
fn flatten_models(
    year: i32,
    make: &ApiMake,
    models: Vec<ApiModel>,
) -> (Vec<ModelRecord>, Vec<EngineRecord>) {
    let mut model_rows = Vec::with_capacity(models.len());
    let mut engine_rows = Vec::new();

    for model in models {
        for engine in model.engines {
            engine_rows.push(EngineRecord {
                engine_id: engine.id,
                vehicle_id: model.id.clone(),
                name: engine.name,
            });
        }
        model_rows.push(ModelRecord {
            vehicle_id: model.id,
            name: model.model,
            year,
            make_id: make.make_id,
            make_name: make.make_name.clone(),
        });
    }

    (model_rows, engine_rows)
}

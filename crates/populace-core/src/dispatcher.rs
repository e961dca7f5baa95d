//! Bounded-parallelism execution of every population index.
//!
//! The [`Dispatcher`] precomputes the per-index initial seeds in one serial
//! pass, then submits one task per index to a fixed-size rayon pool. Each
//! task sends its result back over a crossbeam channel; the dispatcher
//! waits on that channel with a timeout and logs progress whenever a wait
//! expires. Panics are caught at the task boundary and reported as failed
//! indices, so a failing index never halts the others.
//!
//! After every task has reported, the registries are persisted exactly
//! once, the exporter's post-completion hook runs, and the final
//! statistics are printed.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crossbeam_channel::RecvTimeoutError;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::collaborators::{ExportError, PersistError};
use crate::generator::{GenerationError, Generator, IndexResult};
use crate::seed::SeedManager;
use crate::stats::StatisticsSnapshot;

/// Errors that abort a whole run.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The worker pool could not be created.
    #[error("failed to build worker pool: {source}")]
    ThreadPool {
        /// The underlying rayon error.
        #[from]
        source: rayon::ThreadPoolBuildError,
    },

    /// Persisting the registries failed.
    #[error("failed to persist registries: {source}")]
    Persist {
        /// The underlying persistence error.
        #[from]
        source: PersistError,
    },

    /// The post-completion export failed.
    #[error("post-completion export failed: {source}")]
    Export {
        /// The underlying export error.
        #[from]
        source: ExportError,
    },
}

/// An index whose generation loop failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexFailure {
    /// Population index.
    pub index: u32,
    /// Initial seed of the index.
    pub seed: u64,
    /// Rendered error.
    pub error: String,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Requested population size.
    pub population: u32,
    /// Population seed.
    pub seed: u64,
    /// Location label.
    pub location: String,
    /// Completed indices, in index order.
    pub results: Vec<IndexResult>,
    /// Failed indices, in index order.
    pub failures: Vec<IndexFailure>,
    /// Final aggregate statistics.
    pub statistics: StatisticsSnapshot,
}

impl RunReport {
    /// Initial seed of every index, completed or failed, in index order.
    pub fn initial_seeds(&self) -> Vec<u64> {
        let mut seeds: Vec<(u32, u64)> = self
            .results
            .iter()
            .map(|r| (r.index, r.initial_seed))
            .chain(self.failures.iter().map(|f| (f.index, f.seed)))
            .collect();
        seeds.sort_unstable();
        seeds.into_iter().map(|(_, seed)| seed).collect()
    }
}

/// A task's message back to the dispatcher.
struct TaskOutcome {
    index: u32,
    seed: u64,
    result: Result<IndexResult, GenerationError>,
}

/// Runs every population index on a worker pool.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    generator: Arc<Generator>,
}

impl Dispatcher {
    /// Create a dispatcher around a shared generator.
    pub const fn new(generator: Arc<Generator>) -> Self {
        Self { generator }
    }

    /// The shared generator.
    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    /// Generate the whole population and run the end-of-run steps.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the pool cannot be built or an
    /// end-of-run step fails. Failures of individual indices are reported in
    /// [`RunReport::failures`] instead.
    pub fn run(&self) -> Result<RunReport, DispatchError> {
        let config = self.generator.config();
        let location = self.generator.location().label();
        self.generator
            .reporter()
            .banner(config.population, config.seed, &location);
        info!(
            population = config.population,
            seed = config.seed,
            workers = config.workers,
            location = %location,
            filter = ?config.filter,
            "Running with options"
        );

        // Serial pass: seeds never depend on worker scheduling.
        let seeds = SeedManager::new(config.seed).initial_seeds(config.population);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("populace-worker-{i}"))
            .build()?;

        let (tx, rx) = crossbeam_channel::unbounded::<TaskOutcome>();
        for (index, seed) in (0_u32..).zip(seeds) {
            let generator = Arc::clone(&self.generator);
            let tx = tx.clone();
            pool.spawn(move || {
                let result = catch_unwind(AssertUnwindSafe(|| generator.generate_person(index, seed)))
                    .unwrap_or_else(|payload| {
                        Err(GenerationError::Panicked {
                            index,
                            message: panic_message(payload.as_ref()),
                        })
                    });
                if tx.send(TaskOutcome { index, seed, result }).is_err() {
                    warn!(index, "dispatcher stopped listening before task finished");
                }
            });
        }
        drop(tx);

        let expected = usize::try_from(config.population).unwrap_or(usize::MAX);
        let mut results: Vec<IndexResult> = Vec::with_capacity(expected);
        let mut failures: Vec<IndexFailure> = Vec::new();
        loop {
            match rx.recv_timeout(config.wait_log_interval) {
                Ok(outcome) => match outcome.result {
                    Ok(result) => results.push(result),
                    Err(e) => {
                        error!(index = outcome.index, seed = outcome.seed, error = %e, "Index failed");
                        failures.push(IndexFailure {
                            index: outcome.index,
                            seed: outcome.seed,
                            error: e.to_string(),
                        });
                    }
                },
                Err(RecvTimeoutError::Timeout) => {
                    info!(
                        completed = results.len().saturating_add(failures.len()),
                        total = expected,
                        "Waiting for workers to finish..."
                    );
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        drop(pool);

        results.sort_unstable_by_key(|r| r.index);
        failures.sort_unstable_by_key(|f| f.index);

        // Registries are stored last so utilization from every commit is captured.
        let collaborators = self.generator.collaborators();
        if let Some(store) = &collaborators.store {
            store.store_facilities(&collaborators.registries.facilities())?;
            store.store_health_workers(&collaborators.registries.health_workers())?;
        }

        let report = RunReport {
            population: config.population,
            seed: config.seed,
            location,
            results,
            failures,
            statistics: self.generator.stats().snapshot(),
        };
        collaborators.exporter.finish(&report)?;

        self.generator
            .reporter()
            .final_report(&report.statistics, self.generator.metrics());
        if !report.failures.is_empty() {
            warn!(
                failed = report.failures.len(),
                completed = report.results.len(),
                "Some population indices failed"
            );
        }
        let export_failures = report
            .results
            .iter()
            .fold(0_u32, |acc, r| acc.saturating_add(r.export_failures));
        if export_failures > 0 {
            warn!(export_failures, "Some committed people were not exported");
        }
        info!(
            alive = report.statistics.alive,
            dead = report.statistics.dead,
            total = report.statistics.total,
            "Run complete"
        );
        Ok(report)
    }
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("non-string panic payload"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_messages_are_extracted() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[test]
    fn initial_seeds_merge_results_and_failures() {
        let report = RunReport {
            population: 3,
            seed: 1,
            location: String::from("Massachusetts"),
            results: vec![
                IndexResult {
                    index: 2,
                    initial_seed: 30,
                    final_seed: 30,
                    attempts: 1,
                    commits: 1,
                    outcome: populace_types::Outcome::Alive,
                    export_failures: 0,
                },
                IndexResult {
                    index: 0,
                    initial_seed: 10,
                    final_seed: 11,
                    attempts: 2,
                    commits: 2,
                    outcome: populace_types::Outcome::Alive,
                    export_failures: 0,
                },
            ],
            failures: vec![IndexFailure {
                index: 1,
                seed: 20,
                error: String::from("failed"),
            }],
            statistics: StatisticsSnapshot::default(),
        };
        assert_eq!(report.initial_seeds(), vec![10, 20, 30]);
    }
}

//! The per-index generation loop.
//!
//! For one population index the [`Generator`] repeatedly simulates a person
//! from an attempt seed and classifies the terminal outcome against the
//! run's target:
//!
//! | Outcome | Target | Disposition                            |
//! |---------|--------|----------------------------------------|
//! | match   | any    | commit, stop                           |
//! | `Dead`  | `Alive`| commit, rotate seed, retry             |
//! | `Alive` | `Dead` | discard, rotate seed, retry            |
//!
//! Committing means persisting the person, applying its registry tallies,
//! recording transition metrics and statistics, printing its summary, and
//! finally handing it to the exporter. A discarded attempt touches no
//! shared state. An export failure does not undo the commit: it is logged
//! and counted on the index's [`IndexResult`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, error, info};

use populace_demographics::{DemographicSampler, Demographics, DemographicsError, Location};
use populace_types::{Outcome, Person, keys};

use crate::collaborators::{
    Exporter, LifeSimulator, PersistError, PersistenceStore, SimulationError,
};
use crate::config::RunConfig;
use crate::metrics::TransitionMetrics;
use crate::registry::Registries;
use crate::reporter::Reporter;
use crate::seed::{SeedManager, rotate};
use crate::stats::AggregateStatistics;

/// Errors that end the generation loop for one index.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Demographic sampling failed.
    #[error("demographic sampling failed: {source}")]
    Demographics {
        /// The underlying sampling error.
        #[from]
        source: DemographicsError,
    },

    /// The life simulation failed.
    #[error("simulation failed: {source}")]
    Simulation {
        /// The underlying simulation error.
        #[from]
        source: SimulationError,
    },

    /// Persisting a committed person failed.
    #[error("persistence failed: {source}")]
    Persist {
        /// The underlying persistence error.
        #[from]
        source: PersistError,
    },

    /// The location has no city to place people in.
    #[error("location has no cities")]
    NoCity,

    /// The index did not reach its target outcome within the attempt bound.
    #[error("index {index} did not reach its target outcome in {attempts} attempts")]
    RetriesExhausted {
        /// Population index.
        index: u32,
        /// Attempts made.
        attempts: u32,
    },

    /// The task panicked.
    #[error("index {index} panicked: {message}")]
    Panicked {
        /// Population index.
        index: u32,
        /// Panic payload, when it was a string.
        message: String,
    },
}

/// What to do with a finished attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptDisposition {
    /// The outcome matches the target: commit and stop.
    Commit,
    /// A death while searching for a living person: commit, then retry.
    CommitAndRetry,
    /// A survivor while searching for a death: discard and retry.
    DiscardAndRetry,
}

impl AttemptDisposition {
    /// Whether the attempt is committed.
    pub const fn commits(self) -> bool {
        matches!(self, Self::Commit | Self::CommitAndRetry)
    }

    /// Whether the loop continues with a rotated seed.
    pub const fn retries(self) -> bool {
        matches!(self, Self::CommitAndRetry | Self::DiscardAndRetry)
    }
}

/// Classify an attempt's outcome against the target outcome.
pub const fn classify(outcome: Outcome, target: Outcome) -> AttemptDisposition {
    match (outcome, target) {
        (Outcome::Alive, Outcome::Alive) | (Outcome::Dead, Outcome::Dead) => {
            AttemptDisposition::Commit
        }
        (Outcome::Dead, Outcome::Alive) => AttemptDisposition::CommitAndRetry,
        (Outcome::Alive, Outcome::Dead) => AttemptDisposition::DiscardAndRetry,
    }
}

/// Result of a finished generation loop for one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexResult {
    /// Population index.
    pub index: u32,
    /// Seed the index started from.
    pub initial_seed: u64,
    /// Seed of the attempt that met the target.
    pub final_seed: u64,
    /// Attempts made, including the final one.
    pub attempts: u32,
    /// Commits made, including the final one.
    pub commits: u32,
    /// Outcome of the final attempt.
    pub outcome: Outcome,
    /// Committed people the exporter failed to write.
    pub export_failures: u32,
}

/// The external collaborators and shared state a generator drives.
#[derive(Clone)]
pub struct Collaborators {
    /// Life simulation.
    pub simulator: Arc<dyn LifeSimulator>,
    /// Persistence; `None` when the run persists nothing.
    pub store: Option<Arc<dyn PersistenceStore>>,
    /// Record exporter.
    pub exporter: Arc<dyn Exporter>,
    /// Facility and health-worker registries.
    pub registries: Arc<Registries>,
}

/// Runs generation loops for population indices.
///
/// Shared by every worker; all mutable state it touches is behind its own
/// synchronization.
pub struct Generator {
    config: RunConfig,
    location: Location,
    sampler: DemographicSampler,
    collaborators: Collaborators,
    stats: AggregateStatistics,
    reporter: Reporter,
    metrics: Option<TransitionMetrics>,
}

impl core::fmt::Debug for Generator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Generator")
            .field("config", &self.config)
            .field("location", &self.location.label())
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

impl Generator {
    /// Assemble a generator.
    pub fn new(
        config: RunConfig,
        location: Location,
        sampler: DemographicSampler,
        collaborators: Collaborators,
        reporter: Reporter,
    ) -> Self {
        let metrics = config
            .track_transition_metrics
            .then(TransitionMetrics::new);
        Self {
            config,
            location,
            sampler,
            collaborators,
            stats: AggregateStatistics::new(),
            reporter,
            metrics,
        }
    }

    /// The run configuration.
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// The run location.
    pub const fn location(&self) -> &Location {
        &self.location
    }

    /// Aggregate statistics so far.
    pub const fn stats(&self) -> &AggregateStatistics {
        &self.stats
    }

    /// Transition metrics, when tracked.
    pub const fn metrics(&self) -> Option<&TransitionMetrics> {
        self.metrics.as_ref()
    }

    /// The console reporter.
    pub const fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// The collaborators.
    pub const fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Generate a person for `index` from a fresh random seed.
    pub fn generate_random_person(&self, index: u32) -> Result<IndexResult, GenerationError> {
        self.generate_person(index, SeedManager::random_seed())
    }

    /// Run the generation loop for `index` starting from `seed`.
    ///
    /// The city is drawn once from `seed` and kept across retries.
    ///
    /// # Errors
    ///
    /// Any sampling, simulation, or persistence failure ends the loop for
    /// this index. Export failures are counted, not raised. With an attempt bound configured, exceeding it
    /// returns [`GenerationError::RetriesExhausted`].
    pub fn generate_person(&self, index: u32, seed: u64) -> Result<IndexResult, GenerationError> {
        let city = self
            .location
            .random_city(&mut ChaCha8Rng::seed_from_u64(seed))
            .ok_or(GenerationError::NoCity)?;
        let target = self.config.filter.target();

        let mut attempt_seed = seed;
        let mut attempts: u32 = 0;
        let mut commits: u32 = 0;
        let mut export_failures: u32 = 0;
        loop {
            if self.config.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(GenerationError::RetriesExhausted { index, attempts });
            }
            attempts = attempts.saturating_add(1);

            let (person, time) = self.simulate_attempt(attempt_seed, city)?;
            let outcome =
                Outcome::from_alive(self.collaborators.simulator.is_alive(&person, time));
            let disposition = classify(outcome, target);

            if disposition.commits() {
                if !self.commit(index, person, time, outcome)? {
                    export_failures = export_failures.saturating_add(1);
                }
                commits = commits.saturating_add(1);
            } else {
                debug!(index, seed = attempt_seed, attempt = attempts, %outcome, "Attempt discarded");
            }

            if !disposition.retries() {
                info!(index, seed = attempt_seed, attempts, %outcome, "Index complete");
                return Ok(IndexResult {
                    index,
                    initial_seed: seed,
                    final_seed: attempt_seed,
                    attempts,
                    commits,
                    outcome,
                    export_failures,
                });
            }

            let next = rotate(attempt_seed);
            debug!(index, seed = attempt_seed, next_seed = next, attempt = attempts, %outcome, "Retrying with rotated seed");
            attempt_seed = next;
        }
    }

    /// Sample, birth, and step one person to the horizon.
    fn simulate_attempt(
        &self,
        seed: u64,
        city: &Demographics,
    ) -> Result<(Person, DateTime<Utc>), GenerationError> {
        let simulator = &self.collaborators.simulator;
        let mut person = Person::new(seed, self.config.seed);

        let start = self.sampler.sample(&mut person, city)?;
        person.set_attribute(keys::LOCATION, self.location.label());
        simulator.birth(&mut person, start)?;

        let mut modules = simulator.modules();
        let mut time = start;
        while simulator.is_alive(&person, time) && time < self.config.horizon {
            simulator.simulate_step(&mut person, &mut modules, time)?;
            match time.checked_add_signed(self.config.timestep) {
                Some(next) => time = next,
                None => break,
            }
        }
        simulator.finalize_death(&mut person, time)?;
        Ok((person, time))
    }

    /// Commit a finished attempt. Export is last and consumes the person.
    ///
    /// Only a persistence failure aborts the commit, and it happens before
    /// any shared state changes. Returns `false` when the person was
    /// committed but could not be exported.
    fn commit(
        &self,
        index: u32,
        person: Person,
        time: DateTime<Utc>,
        outcome: Outcome,
    ) -> Result<bool, GenerationError> {
        if let Some(store) = &self.collaborators.store {
            store.store_person(&person)?;
        }
        self.collaborators.registries.apply_commit(&person);
        if let Some(metrics) = &self.metrics {
            metrics.record(&person);
        }
        self.stats.record(outcome);
        self.reporter.person_summary(index, &person, time);
        let id = person.id;
        match self.collaborators.exporter.export(index, person, time) {
            Ok(()) => Ok(true),
            Err(err) => {
                error!(index, person = %id, error = %err, "Export failed for committed person");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_outcomes_commit() {
        assert_eq!(classify(Outcome::Alive, Outcome::Alive), AttemptDisposition::Commit);
        assert_eq!(classify(Outcome::Dead, Outcome::Dead), AttemptDisposition::Commit);
    }

    #[test]
    fn death_while_seeking_life_commits_and_retries() {
        let disposition = classify(Outcome::Dead, Outcome::Alive);
        assert_eq!(disposition, AttemptDisposition::CommitAndRetry);
        assert!(disposition.commits());
        assert!(disposition.retries());
    }

    #[test]
    fn survivor_while_seeking_death_is_discarded() {
        let disposition = classify(Outcome::Alive, Outcome::Dead);
        assert_eq!(disposition, AttemptDisposition::DiscardAndRetry);
        assert!(!disposition.commits());
        assert!(disposition.retries());
    }
}

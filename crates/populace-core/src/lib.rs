//! Generation orchestrator for the Populace synthetic population generator.
//!
//! This crate turns a run configuration into a population: it derives
//! reproducible seeds, runs the per-index simulate/classify/commit-or-retry
//! loop, fans the indices out over a worker pool, and reports the result.
//!
//! # Modules
//!
//! - [`collaborators`] -- Traits for the life simulation, persistence, and
//!   export, plus their error types.
//! - [`config`] -- YAML configuration and the frozen [`RunConfig`].
//! - [`dispatcher`] -- Worker pool, progress wait, and end-of-run steps.
//! - [`generator`] -- The per-index generation loop.
//! - [`metrics`] -- Module state-transition counters.
//! - [`registry`] -- Facility and health-worker registries.
//! - [`reporter`] -- Serialized console summaries.
//! - [`seed`] -- Initial seeds and seed rotation.
//! - [`stats`] -- Outcome counters.

pub mod collaborators;
pub mod config;
pub mod dispatcher;
pub mod generator;
pub mod metrics;
pub mod registry;
pub mod reporter;
pub mod seed;
pub mod stats;

pub use collaborators::{
    ExportError, Exporter, LifeModule, LifeSimulator, NoopExporter, PersistError,
    PersistenceStore, SimulationError,
};
pub use config::{ConfigError, LifecycleConfig, RunConfig, SimulationConfig};
pub use dispatcher::{DispatchError, Dispatcher, IndexFailure, RunReport};
pub use generator::{
    AttemptDisposition, Collaborators, GenerationError, Generator, IndexResult, classify,
};
pub use metrics::TransitionMetrics;
pub use registry::Registries;
pub use reporter::Reporter;
pub use seed::{SeedManager, rotate};
pub use stats::{AggregateStatistics, StatisticsSnapshot};

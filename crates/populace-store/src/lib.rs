//! Persistence and export for the Populace generator.
//!
//! Committed people and the facility and health-worker registries are
//! persisted through a [`populace_core::PersistenceStore`]; committed
//! people are exported through a [`populace_core::Exporter`].
//!
//! # Modules
//!
//! - [`store`] -- In-memory and JSON lines stores, and [`open_store`]
//! - [`exporter`] -- Per-person JSON documents and the run summary
//! - [`error`] -- Shared error types

pub mod error;
pub mod exporter;
pub mod store;

pub use error::StoreError;
pub use exporter::{JsonExporter, RUN_SUMMARY_FILE};
pub use store::{
    FACILITIES_FILE, FileStore, HEALTH_WORKERS_FILE, MemoryStore, PERSONS_FILE, open_store,
    read_jsonl,
};

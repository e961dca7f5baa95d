//! Shared type definitions for the Populace synthetic population generator.
//!
//! This crate is the single source of truth for the data model that flows
//! between demographic sampling, the life simulation, the generation
//! orchestrator, persistence, and export.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for person and registry identifiers
//! - [`enums`] -- Outcomes, run switches, and health record vocabulary
//! - [`attributes`] -- Attribute keys and the typed [`AttributeValue`]
//! - [`person`] -- The generated [`Person`] and its [`HealthRecord`]
//! - [`registry`] -- [`Facility`] and [`HealthWorker`] registry entries

pub mod attributes;
pub mod enums;
pub mod ids;
pub mod person;
pub mod registry;

// Re-export all public types at crate root for convenience.
pub use attributes::{AttributeValue, keys};
pub use enums::{EncounterKind, LogDetail, Outcome, OutcomeFilter, PersistenceMode, VitalSign};
pub use ids::{FacilityId, HealthWorkerId, PersonId};
pub use person::{Condition, Death, Encounter, HealthRecord, Person, StateTransition};
pub use registry::{Facility, HealthWorker};

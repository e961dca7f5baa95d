//! Default life simulation for the Populace generator.
//!
//! [`LifeEngine`] implements [`populace_core::LifeSimulator`]: it births a
//! person, runs yearly wellness visits and community health worker
//! interventions, and steps a fixed set of life-course modules until death
//! or the horizon.
//!
//! # Modules
//!
//! - [`engine`] -- The [`LifeEngine`] simulator
//! - [`growth`] -- Vital signs by age
//! - [`childhood`] -- Child-to-adult transition
//! - [`symptoms`] -- Symptom accrual and conditions
//! - [`mortality`] -- Gompertz mortality
//! - [`names`] -- Deterministic name pools

pub mod childhood;
pub mod engine;
pub mod growth;
pub mod mortality;
pub mod names;
pub mod symptoms;

pub use childhood::Childhood;
pub use engine::LifeEngine;
pub use growth::Growth;
pub use mortality::{DeathCause, Mortality};
pub use symptoms::Symptoms;

//! Demographic sampling for the Populace synthetic population generator.
//!
//! Each generation attempt draws one record from a shared
//! [`ReferenceDataset`], maps its coded fields to attribute labels, and
//! derives composite attributes (ethnicity, language, education, income,
//! socioeconomic status) through a city-keyed [`DemographicDerivation`].
//!
//! # Modules
//!
//! - [`codes`] -- Lookup tables from microdata codes to attribute labels.
//! - [`dataset`] -- The reference dataset and its records.
//! - [`derivation`] -- The derivation trait and the default per-city
//!   [`Demographics`] implementation.
//! - [`error`] -- Error types for loading and sampling.
//! - [`location`] -- A state and its population-weighted cities.
//! - [`sampler`] -- [`DemographicSampler`] and the birthdate window.

pub mod codes;
pub mod dataset;
pub mod derivation;
pub mod error;
pub mod location;
pub mod sampler;

pub use dataset::{ReferenceDataset, ReferenceRecord};
pub use derivation::{DemographicDerivation, Demographics, EducationWeights};
pub use error::DemographicsError;
pub use location::{DEFAULT_STATE, Location};
pub use sampler::{DemographicSampler, birthdate_window, sample_birthdate};

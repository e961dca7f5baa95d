//! Error types for the `populace-demographics` crate.
//!
//! Every failure here is fatal to the run: sampling cannot proceed without
//! the reference dataset or a valid location.

use std::path::PathBuf;

/// Errors that can occur while loading or sampling demographics.
#[derive(Debug, thiserror::Error)]
pub enum DemographicsError {
    /// The reference dataset file could not be read.
    #[error("failed to read reference dataset {path}: {source}")]
    DatasetIo {
        /// Path that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The reference dataset is not valid JSON of the expected shape.
    #[error("failed to parse reference dataset: {source}")]
    DatasetParse {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The reference dataset contains no records.
    #[error("reference dataset is empty")]
    EmptyDataset,

    /// The configured state has no city table.
    #[error("unknown state {state}")]
    UnknownState {
        /// Requested state.
        state: String,
    },

    /// The configured city does not exist in the configured state.
    #[error("unknown city {city} in {state}")]
    UnknownCity {
        /// Requested city.
        city: String,
        /// State that was searched.
        state: String,
    },

    /// The birthdate window for a target age falls outside representable time.
    #[error("cannot derive a birthdate for target age {age}")]
    BirthdateOutOfRange {
        /// Target age in years.
        age: u32,
    },
}

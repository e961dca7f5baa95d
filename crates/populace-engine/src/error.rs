//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure that can abort a run before, during,
//! or after dispatch, so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: populace_core::ConfigError,
    },

    /// The location or reference dataset could not be loaded.
    #[error("demographics error: {source}")]
    Demographics {
        /// The underlying demographics error.
        #[from]
        source: populace_demographics::DemographicsError,
    },

    /// The persistence store or exporter could not be opened.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: populace_store::StoreError,
    },

    /// The run itself failed.
    #[error("dispatch error: {source}")]
    Dispatch {
        /// The underlying dispatch error.
        #[from]
        source: populace_core::DispatchError,
    },

    /// The run finished but some indices failed.
    #[error("{failed} of {population} population indices failed")]
    IndicesFailed {
        /// Failed indices.
        failed: usize,
        /// Requested population size.
        population: u32,
    },
}

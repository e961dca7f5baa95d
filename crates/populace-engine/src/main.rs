//! Populace engine binary.
//!
//! Loads configuration, wires the default collaborators into a generator,
//! and runs the whole population through the dispatcher.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `populace-config.yaml` (or `POPULACE_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Freeze the run configuration
//! 4. Resolve the location and load the reference dataset
//! 5. Build the registries, life engine, store, and exporter
//! 6. Dispatch every population index
//! 7. Exit non-zero if any index failed

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use populace_core::{
    Collaborators, Dispatcher, Exporter, Generator, NoopExporter, Registries, Reporter,
    RunConfig, SeedManager, SimulationConfig,
};
use populace_demographics::{DemographicSampler, Location, ReferenceDataset};
use populace_lifecycle::LifeEngine;
use populace_store::{JsonExporter, open_store};

use crate::error::EngineError;

/// Configuration file used when `POPULACE_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "populace-config.yaml";

fn main() -> anyhow::Result<()> {
    // 1. Load configuration. Logging is not up yet, so remember whether
    //    the file was found and report it afterwards.
    let config_path = std::env::var_os("POPULACE_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, found) = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("populace-engine starting");
    if found {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }

    // 3. Freeze the run configuration.
    let run_config = RunConfig::from_config(&config, Utc::now()).map_err(EngineError::from)?;
    info!(
        population = run_config.population,
        seed = run_config.seed,
        horizon = %run_config.horizon,
        timestep_days = run_config.timestep.num_days(),
        workers = run_config.workers,
        persistence = %run_config.persistence,
        "Run configuration frozen"
    );

    // 4. Location and reference dataset. A dataset failure is fatal before
    //    any generation begins.
    let location = Location::new(&config.location.state, config.location.city.as_deref())
        .map_err(EngineError::from)?;
    let dataset = ReferenceDataset::from_file(&config.dataset.path)
        .map_err(EngineError::from)
        .with_context(|| format!("loading reference dataset {}", config.dataset.path.display()))?;
    let sampler = DemographicSampler::new(Arc::new(dataset), run_config.horizon);

    // 5. Collaborators.
    let registries = Arc::new(Registries::initialize(
        &location,
        SeedManager::new(run_config.seed).registry_seed(),
    ));
    let simulator = LifeEngine::new(config.lifecycle.clone(), Arc::clone(&registries))
        .map_err(EngineError::from)?;
    let store = open_store(run_config.persistence, &run_config.database_path)
        .map_err(EngineError::from)?;
    let exporter: Arc<dyn Exporter> = if config.export.enabled {
        Arc::new(
            JsonExporter::new(&config.export.output_dir, config.export.years_of_history)
                .map_err(EngineError::from)?,
        )
    } else {
        info!("Export disabled");
        Arc::new(NoopExporter)
    };

    let population = run_config.population;
    let reporter = Reporter::stdout(run_config.log_detail);
    let generator = Generator::new(
        run_config,
        location,
        sampler,
        Collaborators {
            simulator: Arc::new(simulator),
            store,
            exporter,
            registries,
        },
        reporter,
    );

    // 6. Run.
    let report = Dispatcher::new(Arc::new(generator))
        .run()
        .map_err(EngineError::from)?;

    // 7. Exit status.
    if !report.failures.is_empty() {
        warn!(failed = report.failures.len(), "populace-engine finished with failures");
        return Err(EngineError::IndicesFailed {
            failed: report.failures.len(),
            population,
        }
        .into());
    }
    info!("populace-engine finished");
    Ok(())
}

/// Load configuration from `path`, falling back to defaults (with
/// environment overrides) when the file does not exist.
fn load_config(path: &Path) -> Result<(SimulationConfig, bool), EngineError> {
    if path.exists() {
        Ok((SimulationConfig::from_file(path)?, true))
    } else {
        let mut config = SimulationConfig::default();
        config.apply_env_overrides();
        Ok((config, false))
    }
}

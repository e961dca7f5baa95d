//! Configuration loading and the frozen run configuration.
//!
//! The canonical configuration lives in `populace-config.yaml` at the project
//! root. [`SimulationConfig`] mirrors the YAML structure with defaults for
//! every field; [`RunConfig`] is the validated, immutable view the generator
//! and dispatcher work from.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::Deserialize;

use populace_types::{LogDetail, OutcomeFilter, PersistenceMode};

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A field holds a value outside its allowed range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// `generate.database_type` is not a known persistence mode.
    #[error("invalid persistence mode {value:?} (expected in-memory, file, or none)")]
    InvalidPersistenceMode {
        /// The configured value.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `populace-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Population generation settings.
    #[serde(default)]
    pub generate: GenerateConfig,

    /// Where people are placed.
    #[serde(default)]
    pub location: LocationConfig,

    /// Reference dataset settings.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Life simulation tunables.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Record export settings.
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values afterwards:
    /// - `POPULACE_POPULATION` overrides `generate.population`
    /// - `POPULACE_SEED` overrides `generate.seed`
    /// - `POPULACE_WORKERS` overrides `generate.workers`
    /// - `POPULACE_OUTPUT_DIR` overrides `export.output_dir`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides
    /// are applied.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply `POPULACE_*` environment overrides. Unparseable values are
    /// ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(val) = env_parse("POPULACE_POPULATION") {
            self.generate.population = val;
        }
        if let Some(val) = env_parse("POPULACE_SEED") {
            self.generate.seed = val;
        }
        if let Some(val) = env_parse("POPULACE_WORKERS") {
            self.generate.workers = val;
        }
        if let Ok(val) = std::env::var("POPULACE_OUTPUT_DIR") {
            self.export.output_dir = PathBuf::from(val);
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|val| val.trim().parse().ok())
}

/// Population generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerateConfig {
    /// Number of population indices to fill.
    #[serde(default = "default_population")]
    pub population: u32,

    /// Population seed.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Simulation horizon as `YYYY-MM-DD` or RFC 3339. Unset means now.
    #[serde(default)]
    pub horizon: Option<String>,

    /// Simulation timestep in days.
    #[serde(default = "default_timestep_days")]
    pub timestep_days: u32,

    /// Keep only people who died instead of people alive at the horizon.
    #[serde(default)]
    pub only_dead_patients: bool,

    /// Worker thread count.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Persistence mode: `in-memory`, `file`, or `none`.
    #[serde(default = "default_database_type")]
    pub database_type: String,

    /// Directory for the `file` persistence mode.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Per-person console output: `none`, `simple`, or `detailed`.
    #[serde(default = "default_log_patients_detail")]
    pub log_patients_detail: String,

    /// Count module state transitions and print them at the end.
    #[serde(default)]
    pub track_detailed_transition_metrics: bool,

    /// Attempts allowed per index before it fails. Unset means unbounded.
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// How long the dispatcher waits between progress log lines.
    #[serde(default = "default_wait_log_interval_secs")]
    pub wait_log_interval_secs: u64,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            population: default_population(),
            seed: default_seed(),
            horizon: None,
            timestep_days: default_timestep_days(),
            only_dead_patients: false,
            workers: default_workers(),
            database_type: default_database_type(),
            database_path: default_database_path(),
            log_patients_detail: default_log_patients_detail(),
            track_detailed_transition_metrics: false,
            max_attempts: None,
            wait_log_interval_secs: default_wait_log_interval_secs(),
        }
    }
}

/// Where people are placed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocationConfig {
    /// State name.
    #[serde(default = "default_state")]
    pub state: String,

    /// Optional single city.
    #[serde(default)]
    pub city: Option<String>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            state: default_state(),
            city: None,
        }
    }
}

/// Reference dataset settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatasetConfig {
    /// Path of the JSON reference dataset.
    #[serde(default = "default_dataset_path")]
    pub path: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
        }
    }
}

/// Tunables of the default life simulation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LifecycleConfig {
    /// Days between wellness encounters.
    #[serde(default = "default_wellness_interval_days")]
    pub wellness_interval_days: u32,

    /// Chance per wellness encounter that a community health worker
    /// intervenes.
    #[serde(default = "default_chw_intervention_probability")]
    pub chw_intervention_probability: f64,

    /// Chance per timestep of accruing a symptom.
    #[serde(default = "default_symptom_probability")]
    pub symptom_probability: f64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            wellness_interval_days: default_wellness_interval_days(),
            chw_intervention_probability: default_chw_intervention_probability(),
            symptom_probability: default_symptom_probability(),
        }
    }
}

impl LifecycleConfig {
    /// Check every tunable is in range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero interval or a
    /// probability outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wellness_interval_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "lifecycle.wellness_interval_days",
                reason: String::from("must be at least 1"),
            });
        }
        for (field, value) in [
            (
                "lifecycle.chw_intervention_probability",
                self.chw_intervention_probability,
            ),
            ("lifecycle.symptom_probability", self.symptom_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("{value} is not a probability"),
                });
            }
        }
        Ok(())
    }
}

/// Record export settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportConfig {
    /// Whether committed people are exported.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Output directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Years of health record history kept before the export time.
    #[serde(default = "default_years_of_history")]
    pub years_of_history: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: default_output_dir(),
            years_of_history: default_years_of_history(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const fn default_population() -> u32 {
    1
}

const fn default_seed() -> u64 {
    42
}

const fn default_timestep_days() -> u32 {
    7
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

fn default_database_type() -> String {
    String::from("in-memory")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("output/database")
}

fn default_log_patients_detail() -> String {
    String::from("simple")
}

const fn default_wait_log_interval_secs() -> u64 {
    60
}

fn default_state() -> String {
    String::from(populace_demographics::DEFAULT_STATE)
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/reference_population.json")
}

const fn default_true() -> bool {
    true
}

const fn default_wellness_interval_days() -> u32 {
    365
}

const fn default_chw_intervention_probability() -> f64 {
    0.1
}

const fn default_symptom_probability() -> f64 {
    0.05
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

const fn default_years_of_history() -> u32 {
    10
}

fn default_log_level() -> String {
    String::from("info")
}

// ---------------------------------------------------------------------------
// Frozen run configuration
// ---------------------------------------------------------------------------

/// The validated, immutable configuration of one population run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Target population size, at least 1.
    pub population: u32,
    /// Population seed.
    pub seed: u64,
    /// Simulation horizon.
    pub horizon: DateTime<Utc>,
    /// Simulation timestep, at least one day.
    pub timestep: TimeDelta,
    /// Outcome filter.
    pub filter: OutcomeFilter,
    /// Worker count, at least 1.
    pub workers: usize,
    /// Persistence mode.
    pub persistence: PersistenceMode,
    /// Directory for file persistence.
    pub database_path: PathBuf,
    /// Per-person console output.
    pub log_detail: LogDetail,
    /// Whether transition metrics are collected.
    pub track_transition_metrics: bool,
    /// Attempt bound per index.
    pub max_attempts: Option<u32>,
    /// Interval between dispatcher progress log lines.
    pub wait_log_interval: Duration,
}

impl RunConfig {
    /// Validate `config` and freeze it. `now` stands in for a missing
    /// horizon.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPersistenceMode`] for an unknown
    /// `database_type` and [`ConfigError::InvalidValue`] for any other
    /// out-of-range field.
    pub fn from_config(config: &SimulationConfig, now: DateTime<Utc>) -> Result<Self, ConfigError> {
        let generate = &config.generate;
        config.lifecycle.validate()?;

        let persistence = PersistenceMode::parse(&generate.database_type).ok_or_else(|| {
            ConfigError::InvalidPersistenceMode {
                value: generate.database_type.clone(),
            }
        })?;

        if generate.population == 0 {
            return Err(ConfigError::InvalidValue {
                field: "generate.population",
                reason: String::from("must be at least 1"),
            });
        }
        if generate.workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "generate.workers",
                reason: String::from("must be at least 1"),
            });
        }
        if generate.max_attempts == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "generate.max_attempts",
                reason: String::from("must be at least 1 when set"),
            });
        }
        if generate.wait_log_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "generate.wait_log_interval_secs",
                reason: String::from("must be at least 1"),
            });
        }
        let timestep = match generate.timestep_days {
            0 => None,
            days => TimeDelta::try_days(i64::from(days)),
        }
        .ok_or_else(|| ConfigError::InvalidValue {
            field: "generate.timestep_days",
            reason: format!("{} is not a positive number of days", generate.timestep_days),
        })?;

        let log_detail =
            LogDetail::parse(&generate.log_patients_detail).ok_or_else(|| {
                ConfigError::InvalidValue {
                    field: "generate.log_patients_detail",
                    reason: format!(
                        "{:?} (expected none, simple, or detailed)",
                        generate.log_patients_detail
                    ),
                }
            })?;

        let horizon = match generate.horizon.as_deref() {
            None => now,
            Some(raw) => parse_horizon(raw).ok_or_else(|| ConfigError::InvalidValue {
                field: "generate.horizon",
                reason: format!("{raw:?} is neither YYYY-MM-DD nor RFC 3339"),
            })?,
        };

        Ok(Self {
            population: generate.population,
            seed: generate.seed,
            horizon,
            timestep,
            filter: OutcomeFilter::from_only_dead(generate.only_dead_patients),
            workers: generate.workers,
            persistence,
            database_path: generate.database_path.clone(),
            log_detail,
            track_transition_metrics: generate.track_detailed_transition_metrics,
            max_attempts: generate.max_attempts,
            wait_log_interval: Duration::from_secs(generate.wait_log_interval_secs),
        })
    }
}

fn parse_horizon(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

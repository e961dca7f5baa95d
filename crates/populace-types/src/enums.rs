//! Enumeration types shared across the workspace.
//!
//! Run-level switches ([`OutcomeFilter`], [`LogDetail`], [`PersistenceMode`])
//! and per-entity classifications ([`Outcome`], [`VitalSign`],
//! [`EncounterKind`]).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Terminal outcome of one generation attempt.
///
/// Determined at the simulation horizon or at simulated death, whichever
/// comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The person was alive at the horizon.
    Alive,
    /// The person died before the horizon.
    Dead,
}

impl Outcome {
    /// Both outcomes, in reporting order.
    pub const ALL: [Self; 2] = [Self::Alive, Self::Dead];

    /// Statistics label for this outcome.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Alive => "alive",
            Self::Dead => "dead",
        }
    }

    /// Classify a liveness flag.
    pub const fn from_alive(alive: bool) -> Self {
        if alive { Self::Alive } else { Self::Dead }
    }
}

impl core::fmt::Display for Outcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Global outcome filter for a run.
///
/// Selects which terminal outcome each population index must produce
/// before its generation loop is allowed to stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeFilter {
    /// Keep generating until each index yields a living person.
    #[default]
    PreferAlive,
    /// Keep generating until each index yields a deceased person.
    PreferDead,
}

impl OutcomeFilter {
    /// The desired terminal outcome under this filter.
    pub const fn target(self) -> Outcome {
        match self {
            Self::PreferAlive => Outcome::Alive,
            Self::PreferDead => Outcome::Dead,
        }
    }

    /// Build the filter from the `only_dead_patients` switch.
    pub const fn from_only_dead(only_dead: bool) -> Self {
        if only_dead { Self::PreferDead } else { Self::PreferAlive }
    }
}

// ---------------------------------------------------------------------------
// Run switches
// ---------------------------------------------------------------------------

/// Verbosity of the per-person console summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogDetail {
    /// No per-person output.
    None,
    /// One line per committed person.
    #[default]
    Simple,
    /// One line plus attributes, symptoms, record summary, and vitals.
    Detailed,
}

impl LogDetail {
    /// Parse the configuration spelling (`none`, `simple`, `detailed`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "simple" => Some(Self::Simple),
            "detailed" => Some(Self::Detailed),
            _ => None,
        }
    }
}

/// Where committed people and registries are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersistenceMode {
    /// Keep persisted entities in process memory.
    InMemory,
    /// Append persisted entities to newline-delimited JSON files.
    File,
    /// Persist nothing.
    None,
}

impl PersistenceMode {
    /// Parse the configuration spelling (`in-memory`, `file`, `none`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "in-memory" => Some(Self::InMemory),
            "file" => Some(Self::File),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

impl core::fmt::Display for PersistenceMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InMemory => f.write_str("in-memory"),
            Self::File => f.write_str("file"),
            Self::None => f.write_str("none"),
        }
    }
}

// ---------------------------------------------------------------------------
// Health record vocabulary
// ---------------------------------------------------------------------------

/// A vital sign tracked on each person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalSign {
    /// Body height in centimeters.
    Height,
    /// Body weight in kilograms.
    Weight,
    /// Body mass index.
    Bmi,
    /// Systolic blood pressure in mmHg.
    SystolicBloodPressure,
    /// Diastolic blood pressure in mmHg.
    DiastolicBloodPressure,
    /// Resting heart rate in beats per minute.
    HeartRate,
}

impl core::fmt::Display for VitalSign {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Height => "HEIGHT",
            Self::Weight => "WEIGHT",
            Self::Bmi => "BMI",
            Self::SystolicBloodPressure => "SYSTOLIC_BLOOD_PRESSURE",
            Self::DiastolicBloodPressure => "DIASTOLIC_BLOOD_PRESSURE",
            Self::HeartRate => "HEART_RATE",
        };
        f.write_str(name)
    }
}

/// The kind of a health record encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterKind {
    /// Routine wellness visit at a facility.
    Wellness,
    /// Intervention by a community health worker.
    CommunityHealthWorker,
    /// Death certification.
    DeathCertification,
}

impl core::fmt::Display for EncounterKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Wellness => f.write_str("wellness"),
            Self::CommunityHealthWorker => f.write_str("community_health_worker"),
            Self::DeathCertification => f.write_str("death_certification"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_targets() {
        assert_eq!(OutcomeFilter::PreferAlive.target(), Outcome::Alive);
        assert_eq!(OutcomeFilter::PreferDead.target(), Outcome::Dead);
        assert_eq!(OutcomeFilter::default(), OutcomeFilter::PreferAlive);
        assert_eq!(OutcomeFilter::from_only_dead(true), OutcomeFilter::PreferDead);
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(Outcome::Alive.to_string(), "alive");
        assert_eq!(Outcome::Dead.to_string(), "dead");
        assert_eq!(Outcome::from_alive(false), Outcome::Dead);
    }

    #[test]
    fn persistence_mode_parsing() {
        assert_eq!(PersistenceMode::parse("in-memory"), Some(PersistenceMode::InMemory));
        assert_eq!(PersistenceMode::parse("file"), Some(PersistenceMode::File));
        assert_eq!(PersistenceMode::parse("none"), Some(PersistenceMode::None));
        assert_eq!(PersistenceMode::parse("sqlite"), None);
    }

    #[test]
    fn log_detail_parsing_is_case_insensitive() {
        assert_eq!(LogDetail::parse("Detailed"), Some(LogDetail::Detailed));
        assert_eq!(LogDetail::parse("verbose"), None);
    }
}

//! The generated entity and its health record.
//!
//! A [`Person`] is created fresh for every generation attempt. It owns the
//! attempt's random source, so everything sampled for one attempt
//! (demographics, birthdate, life course) is a pure function of the attempt
//! seed.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeValue, keys};
use crate::enums::{EncounterKind, VitalSign};
use crate::ids::{FacilityId, HealthWorkerId, PersonId};

/// Time and cause of a simulated death.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Death {
    /// When the person died.
    pub time: DateTime<Utc>,
    /// Short cause label.
    pub cause: String,
}

/// One entry in a person's health record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    /// When the encounter happened.
    pub time: DateTime<Utc>,
    /// What kind of encounter it was.
    pub kind: EncounterKind,
    /// Facility that hosted the encounter, if any.
    pub facility: Option<FacilityId>,
    /// Community health worker involved, if any.
    pub health_worker: Option<HealthWorkerId>,
    /// Free-text description.
    pub description: String,
}

/// A diagnosed condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Condition name.
    pub name: String,
    /// Onset time.
    pub onset: DateTime<Utc>,
}

/// Everything that happened to a person during simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Encounters in chronological order.
    pub encounters: Vec<Encounter>,
    /// Conditions in onset order.
    pub conditions: Vec<Condition>,
}

impl HealthRecord {
    /// Drop every entry that happened before `cutoff`.
    ///
    /// Used by exporters that only keep a window of recent history.
    pub fn retain_since(&mut self, cutoff: DateTime<Utc>) {
        self.encounters.retain(|e| e.time >= cutoff);
        self.conditions.retain(|c| c.onset >= cutoff);
    }

    /// Multi-line human readable summary.
    pub fn text_summary(&self) -> String {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for encounter in &self.encounters {
            let entry = counts.entry(encounter.kind.to_string()).or_default();
            *entry = entry.saturating_add(1);
        }

        let mut out = format!(
            "RECORD: {} encounters, {} conditions",
            self.encounters.len(),
            self.conditions.len()
        );
        for (kind, count) in &counts {
            out.push_str(&format!("\n  {kind}: {count}"));
        }
        for condition in &self.conditions {
            out.push_str(&format!(
                "\n  condition {} since {}",
                condition.name,
                condition.onset.date_naive()
            ));
        }
        out
    }
}

/// A module entering a named state, kept for transition metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    /// Module that transitioned.
    pub module: String,
    /// State entered.
    pub state: String,
    /// When the state was entered.
    pub time: DateTime<Utc>,
}

/// A synthetic person produced by one generation attempt.
#[derive(Debug, Clone, Serialize)]
pub struct Person {
    /// Identity, derived from the population seed and the attempt seed.
    pub id: PersonId,
    /// Attempt seed this person was generated from.
    pub seed: u64,
    /// Seed of the whole run.
    pub population_seed: u64,
    /// The attempt's random source.
    #[serde(skip)]
    rng: ChaCha8Rng,
    /// Open-ended attribute map (see [`keys`]).
    pub attributes: BTreeMap<String, AttributeValue>,
    /// Birth time, set by the life simulation at birth.
    pub birthdate: Option<DateTime<Utc>>,
    /// Death, if the person died.
    pub death: Option<Death>,
    /// Health record.
    pub record: HealthRecord,
    /// Most recent vital sign measurements.
    pub vital_signs: BTreeMap<VitalSign, f64>,
    /// Symptom severities by symptom name.
    pub symptoms: BTreeMap<String, u32>,
    /// Module state transitions in order.
    pub history: Vec<StateTransition>,
    /// Encounters per facility during this attempt.
    pub facility_visits: BTreeMap<FacilityId, u32>,
    /// Interventions per community health worker during this attempt.
    pub interventions: BTreeMap<HealthWorkerId, u32>,
}

impl Person {
    /// Create a blank person whose random source is seeded with `seed`.
    pub fn new(seed: u64, population_seed: u64) -> Self {
        Self {
            id: PersonId::from_u64_pair(population_seed, seed),
            seed,
            population_seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            attributes: BTreeMap::new(),
            birthdate: None,
            death: None,
            record: HealthRecord::default(),
            vital_signs: BTreeMap::new(),
            symptoms: BTreeMap::new(),
            history: Vec::new(),
            facility_visits: BTreeMap::new(),
            interventions: BTreeMap::new(),
        }
    }

    /// Mutable access to the attempt's random source.
    pub const fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Uniform draw in `[0, 1)`.
    pub fn rand(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Uniform draw in `[low, high)`; returns `low` for an empty range.
    pub fn rand_range(&mut self, low: f64, high: f64) -> f64 {
        if high > low {
            self.rng.random_range(low..high)
        } else {
            low
        }
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute(&mut self, key: &str, value: impl Into<AttributeValue>) {
        self.attributes.insert(key.to_owned(), value.into());
    }

    /// Look up an attribute.
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Look up a text attribute.
    pub fn text_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(AttributeValue::as_text)
    }

    /// Whether the person is alive at `time`.
    pub fn alive(&self, time: DateTime<Utc>) -> bool {
        self.death.as_ref().is_none_or(|death| death.time > time)
    }

    /// Whole calendar years between birth and `time` (0 before birth).
    pub fn age_in_years(&self, time: DateTime<Utc>) -> u32 {
        let Some(birthdate) = self.birthdate else {
            return 0;
        };
        let born = birthdate.date_naive();
        let now = time.date_naive();
        let mut years = now.year().saturating_sub(born.year());
        if (now.month(), now.day()) < (born.month(), born.day()) {
            years = years.saturating_sub(1);
        }
        u32::try_from(years).unwrap_or(0)
    }

    /// Fractional age in years, using 365.25-day years.
    #[allow(clippy::cast_precision_loss)]
    pub fn age_fraction(&self, time: DateTime<Utc>) -> f64 {
        self.birthdate.map_or(0.0, |birthdate| {
            let days = time.signed_duration_since(birthdate).num_days().max(0);
            days as f64 / 365.25
        })
    }

    /// Sum of all symptom severities.
    pub fn symptom_total(&self) -> u32 {
        self.symptoms
            .values()
            .fold(0_u32, |acc, value| acc.saturating_add(*value))
    }

    /// Latest measurement of a vital sign.
    pub fn vital_sign(&self, sign: VitalSign) -> Option<f64> {
        self.vital_signs.get(&sign).copied()
    }

    /// Number of community health worker interventions received.
    pub fn chw_interventions(&self) -> i64 {
        self.attribute(keys::CHW_INTERVENTION)
            .and_then(AttributeValue::as_integer)
            .unwrap_or(0)
    }

    /// Record a module entering a state.
    pub fn record_transition(&mut self, module: &str, state: &str, time: DateTime<Utc>) {
        self.history.push(StateTransition {
            module: module.to_owned(),
            state: state.to_owned(),
            time,
        });
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .unwrap_or_default()
    }

    #[test]
    fn same_seed_same_draws() {
        let mut a = Person::new(99, 1);
        let mut b = Person::new(99, 1);
        for _ in 0..10 {
            assert!((a.rand() - b.rand()).abs() < f64::EPSILON);
        }
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn alive_until_death_time() {
        let mut person = Person::new(1, 1);
        assert!(person.alive(at(2020, 1, 1)));
        person.death = Some(Death {
            time: at(2010, 6, 1),
            cause: String::from("test"),
        });
        assert!(person.alive(at(2010, 1, 1)));
        assert!(!person.alive(at(2010, 6, 1)));
        assert!(!person.alive(at(2020, 1, 1)));
    }

    #[test]
    fn age_counts_whole_years() {
        let mut person = Person::new(1, 1);
        person.birthdate = Some(at(1990, 6, 15));
        assert_eq!(person.age_in_years(at(2020, 6, 14)), 29);
        assert_eq!(person.age_in_years(at(2020, 6, 15)), 30);
        assert_eq!(person.age_in_years(at(1980, 1, 1)), 0);
    }

    #[test]
    fn symptom_total_sums_severities() {
        let mut person = Person::new(1, 1);
        person.symptoms.insert(String::from("cough"), 3);
        person.symptoms.insert(String::from("fatigue"), 4);
        assert_eq!(person.symptom_total(), 7);
    }

    #[test]
    fn retain_since_filters_history() {
        let mut record = HealthRecord::default();
        for year in [2000, 2010, 2020] {
            record.encounters.push(Encounter {
                time: at(year, 1, 1),
                kind: EncounterKind::Wellness,
                facility: None,
                health_worker: None,
                description: String::from("checkup"),
            });
        }
        record.retain_since(at(2005, 1, 1));
        assert_eq!(record.encounters.len(), 2);
        assert!(record.text_summary().starts_with("RECORD: 2 encounters"));
    }
}

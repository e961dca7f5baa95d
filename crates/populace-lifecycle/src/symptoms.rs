//! Occasional symptom accrual.
//!
//! Each timestep a person accrues one point of a randomly chosen symptom
//! with the configured probability. A symptom that reaches
//! [`CONDITION_THRESHOLD`] is recorded once as a condition.

use chrono::{DateTime, Utc};
use rand::Rng;

use populace_core::{LifeModule, SimulationError};
use populace_types::{Condition, Person};

/// Module name used in transition history.
pub const NAME: &str = "symptoms";

/// Severity at which a symptom becomes a recorded condition.
pub const CONDITION_THRESHOLD: u32 = 10;

/// Highest severity a symptom can reach.
pub const MAX_SEVERITY: u32 = 100;

const SYMPTOMS: &[&str] = &[
    "cough",
    "fatigue",
    "headache",
    "joint_pain",
    "shortness_of_breath",
    "fever",
];

/// Accrues symptoms with a fixed per-step probability.
#[derive(Debug, Clone)]
pub struct Symptoms {
    probability: f64,
}

impl Symptoms {
    /// A module accruing a symptom with `probability` per timestep.
    pub const fn new(probability: f64) -> Self {
        Self { probability }
    }
}

impl LifeModule for Symptoms {
    fn name(&self) -> &str {
        NAME
    }

    fn process(&mut self, person: &mut Person, time: DateTime<Utc>) -> Result<bool, SimulationError> {
        if person.rand() >= self.probability {
            return Ok(false);
        }
        let idx = person.rng().random_range(0..SYMPTOMS.len());
        let Some(symptom) = SYMPTOMS.get(idx) else {
            return Ok(false);
        };

        let severity = person.symptoms.entry((*symptom).to_owned()).or_insert(0);
        *severity = severity.saturating_add(1).min(MAX_SEVERITY);
        if *severity == CONDITION_THRESHOLD {
            person.record.conditions.push(Condition {
                name: (*symptom).to_owned(),
                onset: time,
            });
            person.record_transition(NAME, symptom, time);
        }
        Ok(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single().unwrap()
    }

    #[test]
    fn zero_probability_never_accrues() {
        let mut person = Person::new(2, 1);
        let mut module = Symptoms::new(0.0);
        for _ in 0..100 {
            assert!(!module.process(&mut person, now()).unwrap());
        }
        assert_eq!(person.symptom_total(), 0);
    }

    #[test]
    fn certain_accrual_adds_one_point_per_step() {
        let mut person = Person::new(2, 1);
        let mut module = Symptoms::new(1.0);
        for _ in 0..40 {
            module.process(&mut person, now()).unwrap();
        }
        assert_eq!(person.symptom_total(), 40);
    }

    #[test]
    fn threshold_records_a_condition_once() {
        let mut person = Person::new(2, 1);
        person.symptoms.insert(String::from("cough"), CONDITION_THRESHOLD);
        let mut module = Symptoms::new(1.0);
        for _ in 0..200 {
            module.process(&mut person, now()).unwrap();
        }
        // Every symptom has crossed the threshold by now; "cough" started past it.
        let names: Vec<&str> = person.record.conditions.iter().map(|c| c.name.as_str()).collect();
        assert!(!names.contains(&"cough"));
        assert_eq!(names.len(), SYMPTOMS.len() - 1);
    }
}

//! The default life simulation.
//!
//! [`LifeEngine`] births a person, runs the wellness and community health
//! worker encounters at the start of each timestep, and hands the person to
//! the [`Growth`], [`Childhood`], [`Symptoms`], and [`Mortality`] modules.
//!
//! Facility visits and interventions are tallied on the person only. The
//! shared registries are read here (to find a city's facilities and
//! workers) but never written: utilization reaches them when the generator
//! commits the attempt.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use tracing::debug;

use populace_core::{
    ConfigError, LifeModule, LifeSimulator, LifecycleConfig, Registries, SimulationError,
};
use populace_types::{Encounter, EncounterKind, Person, VitalSign, keys};

use crate::childhood::Childhood;
use crate::growth::{self, Growth};
use crate::mortality::Mortality;
use crate::names;
use crate::symptoms::Symptoms;

/// The default [`LifeSimulator`].
#[derive(Debug, Clone)]
pub struct LifeEngine {
    config: LifecycleConfig,
    wellness_interval: TimeDelta,
    registries: Arc<Registries>,
}

impl LifeEngine {
    /// Build an engine reading facilities and workers from `registries`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a tunable is out of range.
    pub fn new(config: LifecycleConfig, registries: Arc<Registries>) -> Result<Self, ConfigError> {
        config.validate()?;
        let wellness_interval = TimeDelta::try_days(i64::from(config.wellness_interval_days))
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "lifecycle.wellness_interval_days",
                reason: format!("{} days is out of range", config.wellness_interval_days),
            })?;
        Ok(Self {
            config,
            wellness_interval,
            registries,
        })
    }

    /// The engine's tunables.
    pub const fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    fn wellness_due(&self, person: &Person, time: DateTime<Utc>) -> bool {
        person
            .record
            .encounters
            .iter()
            .rev()
            .find(|e| e.kind == EncounterKind::Wellness)
            .is_none_or(|last| time.signed_duration_since(last.time) >= self.wellness_interval)
    }

    fn wellness_encounter(&self, person: &mut Person, city: &str, time: DateTime<Utc>) {
        let facilities = self.registries.facilities_in(city);
        let facility = pick(person, &facilities);
        if let Some(id) = facility {
            let visits = person.facility_visits.entry(id).or_insert(0);
            *visits = visits.saturating_add(1);
        }
        person.record.encounters.push(Encounter {
            time,
            kind: EncounterKind::Wellness,
            facility,
            health_worker: None,
            description: String::from("Annual wellness visit"),
        });
    }

    fn chw_intervention(&self, person: &mut Person, city: &str, time: DateTime<Utc>) {
        if person.rand() >= self.config.chw_intervention_probability {
            return;
        }
        let workers = self.registries.health_workers_in(city);
        let Some(worker) = pick(person, &workers) else {
            return;
        };

        let count = person.interventions.entry(worker).or_insert(0);
        *count = count.saturating_add(1);
        let total = person.chw_interventions().saturating_add(1);
        person.set_attribute(keys::CHW_INTERVENTION, total);
        person.record.encounters.push(Encounter {
            time,
            kind: EncounterKind::CommunityHealthWorker,
            facility: None,
            health_worker: Some(worker),
            description: String::from("Community health worker intervention"),
        });
    }
}

impl LifeSimulator for LifeEngine {
    fn modules(&self) -> Vec<Box<dyn LifeModule>> {
        vec![
            Box::new(Growth::new()),
            Box::new(Childhood::new()),
            Box::new(Symptoms::new(self.config.symptom_probability)),
            Box::new(Mortality::new()),
        ]
    }

    fn birth(&self, person: &mut Person, time: DateTime<Utc>) -> Result<(), SimulationError> {
        person.birthdate = Some(time);
        person.set_attribute(keys::BIRTHDATE, time.to_rfc3339());

        let gender = person.text_attribute(keys::GENDER).map(str::to_owned);
        let female = gender.as_deref() == Some("F");
        let name = names::pick_name(person.rng(), gender.as_deref());
        debug!(seed = person.seed, name = %name, birthdate = %time, "Person born");
        person.set_attribute(keys::NAME, name);
        person.set_attribute(keys::CHW_INTERVENTION, 0_i64);

        let height = growth::expected_height(0.0, female);
        let bmi = growth::expected_bmi(0.0, 0.0);
        person.vital_signs.insert(VitalSign::Height, height);
        person
            .vital_signs
            .insert(VitalSign::Weight, bmi * (height / 100.0).powi(2));
        person.vital_signs.insert(VitalSign::Bmi, bmi);
        person
            .vital_signs
            .insert(VitalSign::SystolicBloodPressure, growth::expected_systolic(0.0));
        person
            .vital_signs
            .insert(VitalSign::DiastolicBloodPressure, growth::expected_diastolic(0.0));
        person
            .vital_signs
            .insert(VitalSign::HeartRate, growth::expected_heart_rate(0.0));
        Ok(())
    }

    fn process_encounters(
        &self,
        person: &mut Person,
        time: DateTime<Utc>,
    ) -> Result<(), SimulationError> {
        if !self.wellness_due(person, time) {
            return Ok(());
        }
        let city = person
            .text_attribute(keys::CITY)
            .map(str::to_owned)
            .ok_or_else(|| SimulationError::InvalidState {
                message: String::from("person has no city"),
            })?;
        self.wellness_encounter(person, &city, time);
        self.chw_intervention(person, &city, time);
        Ok(())
    }

    fn finalize_death(&self, person: &mut Person, time: DateTime<Utc>) -> Result<(), SimulationError> {
        let Some(death) = person.death.clone() else {
            return Ok(());
        };
        if death.time > time {
            return Ok(());
        }
        let certified = person
            .record
            .encounters
            .iter()
            .any(|e| e.kind == EncounterKind::DeathCertification);
        if !certified {
            person.record.encounters.push(Encounter {
                time: death.time,
                kind: EncounterKind::DeathCertification,
                facility: None,
                health_worker: None,
                description: format!("Death certificate: {}", death.cause),
            });
        }
        Ok(())
    }
}

/// Uniform choice from `ids` with the person's random source.
fn pick<T: Copy>(person: &mut Person, ids: &[T]) -> Option<T> {
    if ids.is_empty() {
        return None;
    }
    let idx = person.rng().random_range(0..ids.len());
    ids.get(idx).copied()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing
)]
mod tests {
    use chrono::TimeZone;
    use populace_demographics::Location;
    use populace_types::Death;

    use super::*;

    fn at(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single().unwrap()
    }

    fn registries() -> Arc<Registries> {
        let location = Location::new("Massachusetts", Some("Boston")).unwrap();
        Arc::new(Registries::initialize(&location, 7))
    }

    fn engine(config: LifecycleConfig) -> LifeEngine {
        LifeEngine::new(config, registries()).unwrap()
    }

    fn bostonian(seed: u64) -> Person {
        let mut person = Person::new(seed, 1);
        person.set_attribute(keys::CITY, "Boston");
        person.set_attribute(keys::GENDER, "F");
        person
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = LifecycleConfig {
            wellness_interval_days: 0,
            ..LifecycleConfig::default()
        };
        assert!(LifeEngine::new(config, registries()).is_err());
    }

    #[test]
    fn birth_names_and_measures() {
        let engine = engine(LifecycleConfig::default());
        let mut person = bostonian(4);
        engine.birth(&mut person, at(2000)).unwrap();

        assert_eq!(person.birthdate, Some(at(2000)));
        assert!(person.text_attribute(keys::NAME).is_some());
        assert!(person.text_attribute(keys::BIRTHDATE).is_some());
        assert_eq!(person.chw_interventions(), 0);
        assert_eq!(person.vital_signs.len(), 6);
    }

    #[test]
    fn wellness_visits_follow_the_interval() {
        let engine = engine(LifecycleConfig {
            chw_intervention_probability: 0.0,
            ..LifecycleConfig::default()
        });
        let mut person = bostonian(4);
        engine.birth(&mut person, at(2000)).unwrap();

        let mut time = at(2000);
        while time < at(2010) {
            engine.process_encounters(&mut person, time).unwrap();
            time += TimeDelta::days(7);
        }
        let visits: u32 = person.facility_visits.values().sum();
        assert!((10..=11).contains(&visits), "{visits}");
        assert_eq!(person.record.encounters.len(), visits as usize);
        assert!(person.interventions.is_empty());
    }

    #[test]
    fn interventions_are_tallied_on_the_person_only() {
        let registries = registries();
        let engine = LifeEngine::new(
            LifecycleConfig {
                chw_intervention_probability: 1.0,
                ..LifecycleConfig::default()
            },
            Arc::clone(&registries),
        )
        .unwrap();
        let mut person = bostonian(8);
        engine.birth(&mut person, at(2000)).unwrap();
        engine.process_encounters(&mut person, at(2000)).unwrap();
        engine.process_encounters(&mut person, at(2001)).unwrap();

        assert_eq!(person.chw_interventions(), 2);
        assert_eq!(person.interventions.values().sum::<u32>(), 2);
        assert!(registries.health_workers().iter().all(|w| w.interventions == 0));
        assert!(registries.facilities().iter().all(|f| f.encounters == 0));
    }

    #[test]
    fn missing_city_is_an_error() {
        let engine = engine(LifecycleConfig::default());
        let mut person = Person::new(1, 1);
        assert!(engine.process_encounters(&mut person, at(2000)).is_err());
    }

    #[test]
    fn death_is_certified_once() {
        let engine = engine(LifecycleConfig::default());
        let mut person = bostonian(2);
        person.death = Some(Death {
            time: at(2005),
            cause: String::from("natural_causes"),
        });
        engine.finalize_death(&mut person, at(2006)).unwrap();
        engine.finalize_death(&mut person, at(2006)).unwrap();

        let certificates: Vec<_> = person
            .record
            .encounters
            .iter()
            .filter(|e| e.kind == EncounterKind::DeathCertification)
            .collect();
        assert_eq!(certificates.len(), 1);
        assert_eq!(certificates[0].time, at(2005));
        assert!(!engine.is_alive(&person, at(2006)));
    }

    #[test]
    fn survivors_get_no_certificate() {
        let engine = engine(LifecycleConfig::default());
        let mut person = bostonian(2);
        engine.finalize_death(&mut person, at(2006)).unwrap();
        assert!(person.record.encounters.is_empty());
    }

    #[test]
    fn a_full_life_is_reproducible() {
        let engine = engine(LifecycleConfig::default());
        let run = |seed: u64| {
            let mut person = bostonian(seed);
            engine.birth(&mut person, at(1950)).unwrap();
            let mut modules = engine.modules();
            let mut time = at(1950);
            while engine.is_alive(&person, time) && time < at(2024) {
                engine.simulate_step(&mut person, &mut modules, time).unwrap();
                time += TimeDelta::days(30);
            }
            engine.finalize_death(&mut person, time).unwrap();
            person
        };

        let a = run(17);
        let b = run(17);
        assert_eq!(a.death, b.death);
        assert_eq!(a.record, b.record);
        assert_eq!(a.history, b.history);
        if a.death.as_ref().is_none_or(|d| d.time >= at(1968)) {
            assert!(a.history.iter().any(|t| t.module == "childhood" && t.state == "adult"));
        }
    }
}

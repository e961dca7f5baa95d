//! Collaborator traits the generator drives.
//!
//! The generator owns the retry policy and shared state; everything else
//! (the per-timestep life course, persistence, export) sits behind the
//! traits in this module. Implementations live in other crates:
//! `populace-lifecycle` for [`LifeSimulator`], `populace-store` for
//! [`PersistenceStore`] and [`Exporter`].

use chrono::{DateTime, Utc};

use populace_types::{Facility, HealthWorker, Person};

use crate::dispatcher::RunReport;

/// Errors raised by the life simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// A life-course module failed.
    #[error("module {module} failed: {message}")]
    Module {
        /// Module name.
        module: String,
        /// What went wrong.
        message: String,
    },

    /// The person is in a state the simulation cannot continue from.
    #[error("invalid person state: {message}")]
    InvalidState {
        /// What went wrong.
        message: String,
    },
}

/// Errors raised by a persistence store.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Writing to the backing storage failed.
    #[error("persistence I/O failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An entity could not be encoded.
    #[error("failed to encode entity: {source}")]
    Encode {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

/// Errors raised by an exporter.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Writing an export file failed.
    #[error("export I/O failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A record could not be encoded.
    #[error("failed to encode export: {source}")]
    Encode {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

/// One life-course module (growth, mortality, ...).
///
/// A fresh set of modules is created for every attempt, so modules may keep
/// per-attempt state.
pub trait LifeModule: Send {
    /// Module name, used in transition history.
    fn name(&self) -> &str;

    /// Advance the module one timestep. Returns `true` once the module has
    /// terminated and must not be processed again.
    fn process(&mut self, person: &mut Person, time: DateTime<Utc>)
    -> Result<bool, SimulationError>;
}

/// The per-timestep life simulation.
pub trait LifeSimulator: Send + Sync {
    /// Fresh modules for one attempt.
    fn modules(&self) -> Vec<Box<dyn LifeModule>>;

    /// Initialize the person at `time`.
    fn birth(&self, person: &mut Person, time: DateTime<Utc>) -> Result<(), SimulationError>;

    /// Encounter processing at the start of a timestep.
    fn process_encounters(
        &self,
        person: &mut Person,
        time: DateTime<Utc>,
    ) -> Result<(), SimulationError>;

    /// Close any encounter opened by [`process_encounters`](Self::process_encounters).
    fn end_encounters(&self, _person: &mut Person, _time: DateTime<Utc>) -> Result<(), SimulationError> {
        Ok(())
    }

    /// Settle the terminal state at the end of the simulation.
    fn finalize_death(&self, person: &mut Person, time: DateTime<Utc>)
    -> Result<(), SimulationError>;

    /// Whether the person is alive at `time`.
    fn is_alive(&self, person: &Person, time: DateTime<Utc>) -> bool {
        person.alive(time)
    }

    /// Run one timestep: encounters, then every live module in order.
    ///
    /// Modules that report termination are removed from `modules`. Returns
    /// `true` when at least one module terminated during this step.
    fn simulate_step(
        &self,
        person: &mut Person,
        modules: &mut Vec<Box<dyn LifeModule>>,
        time: DateTime<Utc>,
    ) -> Result<bool, SimulationError> {
        self.process_encounters(person, time)?;
        let mut terminated = false;
        let mut index = 0_usize;
        while let Some(module) = modules.get_mut(index) {
            if module.process(person, time)? {
                modules.remove(index);
                terminated = true;
            } else {
                index = index.saturating_add(1);
            }
        }
        self.end_encounters(person, time)?;
        Ok(terminated)
    }
}

/// Where committed people and the registries are persisted.
pub trait PersistenceStore: Send + Sync {
    /// Persist one committed person.
    fn store_person(&self, person: &Person) -> Result<(), PersistError>;

    /// Persist the facility registry.
    fn store_facilities(&self, facilities: &[Facility]) -> Result<(), PersistError>;

    /// Persist the health-worker registry.
    fn store_health_workers(&self, workers: &[HealthWorker]) -> Result<(), PersistError>;
}

/// Record export.
///
/// `export` takes the person by value: export may filter the record
/// destructively, so it is the last thing done with a committed person.
pub trait Exporter: Send + Sync {
    /// Export one committed person as of `time`.
    fn export(&self, index: u32, person: Person, time: DateTime<Utc>) -> Result<(), ExportError>;

    /// Post-completion export, run once after every task finished.
    fn finish(&self, _report: &RunReport) -> Result<(), ExportError> {
        Ok(())
    }
}

/// Exporter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExporter;

impl Exporter for NoopExporter {
    fn export(&self, _index: u32, _person: Person, _time: DateTime<Utc>) -> Result<(), ExportError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    struct Countdown {
        name: String,
        remaining: u32,
    }

    impl LifeModule for Countdown {
        fn name(&self) -> &str {
            &self.name
        }

        fn process(&mut self, person: &mut Person, time: DateTime<Utc>) -> Result<bool, SimulationError> {
            person.record_transition(&self.name, "tick", time);
            self.remaining = self.remaining.saturating_sub(1);
            Ok(self.remaining == 0)
        }
    }

    struct Failing;

    impl LifeModule for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn process(&mut self, _person: &mut Person, _time: DateTime<Utc>) -> Result<bool, SimulationError> {
            Err(SimulationError::Module {
                module: String::from("failing"),
                message: String::from("boom"),
            })
        }
    }

    struct Bare;

    impl LifeSimulator for Bare {
        fn modules(&self) -> Vec<Box<dyn LifeModule>> {
            vec![
                Box::new(Countdown {
                    name: String::from("short"),
                    remaining: 1,
                }),
                Box::new(Countdown {
                    name: String::from("long"),
                    remaining: 3,
                }),
            ]
        }

        fn birth(&self, _person: &mut Person, _time: DateTime<Utc>) -> Result<(), SimulationError> {
            Ok(())
        }

        fn process_encounters(&self, _person: &mut Person, _time: DateTime<Utc>) -> Result<(), SimulationError> {
            Ok(())
        }

        fn finalize_death(&self, _person: &mut Person, _time: DateTime<Utc>) -> Result<(), SimulationError> {
            Ok(())
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).single().unwrap()
    }

    #[test]
    fn terminated_modules_are_removed() {
        let simulator = Bare;
        let mut person = Person::new(1, 1);
        let mut modules = simulator.modules();

        assert!(simulator.simulate_step(&mut person, &mut modules, at()).unwrap());
        assert_eq!(modules.len(), 1);
        assert!(!simulator.simulate_step(&mut person, &mut modules, at()).unwrap());
        assert!(simulator.simulate_step(&mut person, &mut modules, at()).unwrap());
        assert!(modules.is_empty());
        assert_eq!(person.history.len(), 4);
    }

    #[test]
    fn module_errors_propagate() {
        let simulator = Bare;
        let mut person = Person::new(1, 1);
        let mut modules: Vec<Box<dyn LifeModule>> = vec![Box::new(Failing)];
        let result = simulator.simulate_step(&mut person, &mut modules, at());
        assert!(matches!(result, Err(SimulationError::Module { .. })));
    }

    #[test]
    fn noop_exporter_accepts_people() {
        assert!(NoopExporter.export(0, Person::new(1, 1), at()).is_ok());
    }
}

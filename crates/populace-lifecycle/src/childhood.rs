//! Transition from child to adult.

use chrono::{DateTime, Utc};

use populace_core::{LifeModule, SimulationError};
use populace_types::{Person, keys};

/// Module name used in transition history.
pub const NAME: &str = "childhood";

/// Age at which a person becomes an adult.
pub const ADULT_AGE: u32 = 18;

/// Records `child` on first use and `adult` at [`ADULT_AGE`], then
/// terminates.
#[derive(Debug, Clone, Default)]
pub struct Childhood {
    entered: bool,
}

impl Childhood {
    /// A module that has not yet seen the person.
    pub const fn new() -> Self {
        Self { entered: false }
    }
}

impl LifeModule for Childhood {
    fn name(&self) -> &str {
        NAME
    }

    fn process(&mut self, person: &mut Person, time: DateTime<Utc>) -> Result<bool, SimulationError> {
        if person.age_in_years(time) >= ADULT_AGE {
            person.record_transition(NAME, "adult", time);
            person.set_attribute(keys::ADULT, true);
            return Ok(true);
        }
        if !self.entered {
            self.entered = true;
            person.record_transition(NAME, "child", time);
            person.set_attribute(keys::ADULT, false);
        }
        Ok(false)
    }
}

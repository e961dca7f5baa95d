//! Death by age-dependent hazard.
//!
//! Mortality follows a Gompertz law: the annual hazard at age `a` is
//! `alpha * exp(beta * a)`. Over a step of `dt` years the chance of death
//! is `1 - exp(-hazard * dt)`. Anyone still alive at [`MAX_AGE`] dies of
//! old age.

use chrono::{DateTime, Utc};

use populace_core::{LifeModule, SimulationError};
use populace_types::{Death, Person};

/// Module name used in transition history.
pub const NAME: &str = "mortality";

/// Age at which death is certain.
pub const MAX_AGE: u32 = 110;

/// Gompertz baseline hazard per year.
pub const GOMPERTZ_ALPHA: f64 = 5e-5;

/// Gompertz hazard growth per year of age.
pub const GOMPERTZ_BETA: f64 = 0.085;

/// The cause of a simulated death.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeathCause {
    /// The age hazard fired.
    NaturalCauses,
    /// The person reached [`MAX_AGE`].
    OldAge,
}

impl core::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NaturalCauses => write!(f, "natural_causes"),
            Self::OldAge => write!(f, "old_age"),
        }
    }
}

/// Annual Gompertz hazard at `age` years.
pub fn annual_hazard(age: f64) -> f64 {
    GOMPERTZ_ALPHA * (GOMPERTZ_BETA * age.max(0.0)).exp()
}

/// Probability of dying within `years` starting at `age`.
pub fn step_probability(age: f64, years: f64) -> f64 {
    if years <= 0.0 {
        return 0.0;
    }
    1.0 - (-annual_hazard(age) * years).exp()
}

/// Rolls the hazard once per timestep and records the death.
#[derive(Debug, Clone, Default)]
pub struct Mortality {
    last: Option<DateTime<Utc>>,
}

impl Mortality {
    /// A module that has not stepped yet.
    pub const fn new() -> Self {
        Self { last: None }
    }

    fn die(person: &mut Person, time: DateTime<Utc>, cause: DeathCause) {
        person.death = Some(Death {
            time,
            cause: cause.to_string(),
        });
        person.record_transition(NAME, "dead", time);
    }
}

impl LifeModule for Mortality {
    fn name(&self) -> &str {
        NAME
    }

    #[allow(clippy::cast_precision_loss)]
    fn process(&mut self, person: &mut Person, time: DateTime<Utc>) -> Result<bool, SimulationError> {
        if person.death.is_some() {
            return Ok(true);
        }
        if person.age_in_years(time) >= MAX_AGE {
            Self::die(person, time, DeathCause::OldAge);
            return Ok(true);
        }

        let Some(last) = self.last.replace(time) else {
            return Ok(false);
        };
        let years = time.signed_duration_since(last).num_seconds() as f64 / (365.25 * 86_400.0);
        let chance = step_probability(person.age_fraction(time), years);
        if person.rand() < chance {
            Self::die(person, time, DeathCause::NaturalCauses);
            return Ok(true);
        }
        Ok(false)
    }
}

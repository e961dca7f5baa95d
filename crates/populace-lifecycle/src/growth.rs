//! Vital signs by age.
//!
//! Each timestep the [`Growth`] module re-measures every vital sign from
//! the person's age and sex:
//!
//! - Height follows a piecewise-linear curve: 50 cm at birth, 86 cm at two,
//!   then linear to the adult height at eighteen.
//! - Weight follows from height and a body mass index that starts at 16 in
//!   childhood and drifts from a per-person adult baseline until 50.
//! - Blood pressure rises slowly with age; resting heart rate falls from
//!   130 in infancy to 70 by adulthood.
//!
//! Small per-measurement noise is drawn from the attempt's random source.
//! The module never terminates.

use chrono::{DateTime, Utc};

use populace_core::{LifeModule, SimulationError};
use populace_types::{Person, VitalSign, keys};

/// Module name used in transition history.
pub const NAME: &str = "growth";

/// Adult height in centimeters by recorded sex.
const ADULT_HEIGHT_FEMALE: f64 = 163.0;
const ADULT_HEIGHT_MALE: f64 = 176.0;

/// Body mass index before adulthood.
const CHILD_BMI: f64 = 16.0;

/// Re-measures vital signs every timestep.
#[derive(Debug, Clone, Default)]
pub struct Growth {
    /// Adult BMI baseline, drawn on first use.
    adult_bmi: Option<f64>,
}

impl Growth {
    /// A module with no baseline drawn yet.
    pub const fn new() -> Self {
        Self { adult_bmi: None }
    }

    fn adult_bmi(&mut self, person: &mut Person) -> f64 {
        *self
            .adult_bmi
            .get_or_insert_with(|| person.rand_range(20.0, 29.0))
    }
}

impl LifeModule for Growth {
    fn name(&self) -> &str {
        NAME
    }

    fn process(&mut self, person: &mut Person, time: DateTime<Utc>) -> Result<bool, SimulationError> {
        let adult_bmi = self.adult_bmi(person);
        let female = person.text_attribute(keys::GENDER) == Some("F");
        let age = person.age_fraction(time);

        let height = expected_height(age, female) + person.rand_range(-0.5, 0.5);
        let bmi = expected_bmi(age, adult_bmi);
        let weight = bmi * (height / 100.0).powi(2);
        let systolic = expected_systolic(age) + person.rand_range(-4.0, 4.0);
        let diastolic = expected_diastolic(age) + person.rand_range(-3.0, 3.0);
        let heart_rate = expected_heart_rate(age) + person.rand_range(-5.0, 5.0);

        person.vital_signs.insert(VitalSign::Height, height);
        person.vital_signs.insert(VitalSign::Weight, weight);
        person.vital_signs.insert(VitalSign::Bmi, bmi);
        person
            .vital_signs
            .insert(VitalSign::SystolicBloodPressure, systolic);
        person
            .vital_signs
            .insert(VitalSign::DiastolicBloodPressure, diastolic);
        person.vital_signs.insert(VitalSign::HeartRate, heart_rate);
        Ok(false)
    }
}

/// Height in centimeters at `age` years.
pub fn expected_height(age: f64, female: bool) -> f64 {
    let adult = if female {
        ADULT_HEIGHT_FEMALE
    } else {
        ADULT_HEIGHT_MALE
    };
    let age = age.max(0.0);
    if age < 2.0 {
        18.0f64.mul_add(age, 50.0)
    } else if age < 18.0 {
        (adult - 86.0).mul_add((age - 2.0) / 16.0, 86.0)
    } else {
        adult
    }
}

/// Body mass index at `age` years for a person with adult baseline
/// `adult_bmi`.
pub fn expected_bmi(age: f64, adult_bmi: f64) -> f64 {
    if age < 18.0 {
        CHILD_BMI
    } else {
        0.1f64.mul_add(age.min(50.0) - 18.0, adult_bmi)
    }
}

/// Systolic blood pressure in mmHg.
pub fn expected_systolic(age: f64) -> f64 {
    0.5f64.mul_add(age.clamp(0.0, 80.0), 90.0)
}

/// Diastolic blood pressure in mmHg.
pub fn expected_diastolic(age: f64) -> f64 {
    0.25f64.mul_add(age.clamp(0.0, 80.0), 60.0)
}

/// Resting heart rate in beats per minute.
pub fn expected_heart_rate(age: f64) -> f64 {
    if age < 18.0 {
        (60.0 / 18.0f64).mul_add(-age.max(0.0), 130.0)
    } else {
        70.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn height_curve_hits_its_anchors() {
        assert!(close(expected_height(0.0, false), 50.0));
        assert!(close(expected_height(2.0, false), 86.0));
        assert!(close(expected_height(18.0, true), ADULT_HEIGHT_FEMALE));
        assert!(close(expected_height(40.0, false), ADULT_HEIGHT_MALE));
        assert!(expected_height(10.0, false) > expected_height(9.0, false));
    }

    #[test]
    fn heart_rate_settles_in_adulthood() {
        assert!(close(expected_heart_rate(0.0), 130.0));
        assert!(close(expected_heart_rate(18.0), 70.0));
        assert!(close(expected_heart_rate(60.0), 70.0));
    }

    #[test]
    fn bmi_drifts_until_fifty() {
        assert!(close(expected_bmi(10.0, 24.0), CHILD_BMI));
        assert!(close(expected_bmi(18.0, 24.0), 24.0));
        assert!(close(expected_bmi(50.0, 24.0), expected_bmi(70.0, 24.0)));
    }

    #[test]
    fn process_measures_every_vital_sign() {
        let mut person = Person::new(5, 1);
        person.birthdate = Some(Utc.with_ymd_and_hms(1990, 1, 1, 0, 0, 0).single().unwrap());
        person.set_attribute(keys::GENDER, "F");
        let mut growth = Growth::new();
        let now = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single().unwrap();

        assert!(!growth.process(&mut person, now).unwrap());
        assert_eq!(person.vital_signs.len(), 6);
        let height = person.vital_sign(VitalSign::Height).unwrap();
        assert!((height - ADULT_HEIGHT_FEMALE).abs() <= 0.5);
        let bmi = person.vital_sign(VitalSign::Bmi).unwrap();
        let weight = person.vital_sign(VitalSign::Weight).unwrap();
        assert!(close(weight, bmi * (height / 100.0).powi(2)));
    }

    #[test]
    fn baseline_is_drawn_once() {
        let mut person = Person::new(5, 1);
        person.birthdate = Some(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).single().unwrap());
        let mut growth = Growth::new();
        let first = growth.adult_bmi(&mut person);
        assert!(close(growth.adult_bmi(&mut person), first));
    }
}

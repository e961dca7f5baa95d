//! Demographic sampling for one generation attempt.
//!
//! [`DemographicSampler::sample`] draws one reference record with the
//! attempt's random source, resolves its coded fields, asks the city's
//! [`DemographicDerivation`] for the composite attributes, and returns a
//! birthdate that makes the person exactly the record's age at the horizon.
//!
//! Attributes are collected first and written to the person only once the
//! whole set (including the birthdate) has been derived, so a failure never
//! leaves a partial attribute set behind.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use tracing::debug;

use populace_types::{AttributeValue, Person, keys};

use crate::codes::{self, Code};
use crate::dataset::{ReferenceDataset, ReferenceRecord};
use crate::derivation::DemographicDerivation;
use crate::error::DemographicsError;

/// Days per year used for the birthdate window.
const DAYS_PER_YEAR: i64 = 365;

/// Samples demographic attributes from a shared reference dataset.
#[derive(Debug, Clone)]
pub struct DemographicSampler {
    dataset: Arc<ReferenceDataset>,
    horizon: DateTime<Utc>,
}

impl DemographicSampler {
    /// Create a sampler over `dataset` for a run ending at `horizon`.
    pub const fn new(dataset: Arc<ReferenceDataset>, horizon: DateTime<Utc>) -> Self {
        Self { dataset, horizon }
    }

    /// The shared dataset.
    pub fn dataset(&self) -> &ReferenceDataset {
        &self.dataset
    }

    /// Populate `person`'s demographic attributes and return its birthdate.
    ///
    /// # Errors
    ///
    /// Fails when no record can be drawn or the birthdate window for the
    /// record's age is not representable. The person is left untouched.
    pub fn sample(
        &self,
        person: &mut Person,
        city: &dyn DemographicDerivation,
    ) -> Result<DateTime<Utc>, DemographicsError> {
        let (index, record) = self.dataset.sample(person.rng())?;
        let mut attributes = resolve_record(record);

        attributes.push((keys::CITY, city.city().into()));
        attributes.push((keys::STATE, city.state().into()));

        let race = lookup(&attributes, keys::RACE).map(str::to_owned);
        let ethnicity = match codes::normalize(&record.hispanic_origin) {
            Code::Value(codes::NOT_HISPANIC) => {
                attributes.push((keys::HISPANIC, false.into()));
                Some(city.ethnicity_from_race(race.as_deref().unwrap_or_default(), person.rng()))
            }
            Code::Value(_) => {
                attributes.push((keys::RACE, "hispanic".into()));
                attributes.push((keys::HISPANIC, true.into()));
                codes::HISPANIC_ORIGIN
                    .resolve(&record.hispanic_origin)
                    .map(str::to_owned)
            }
            // Unknown origin: race stays as coded, no Hispanic flag.
            Code::Missing | Code::Invalid => None,
        };
        let language = city.language_from_ethnicity(ethnicity.as_deref(), person.rng());
        if let Some(ethnicity) = ethnicity {
            attributes.push((keys::ETHNICITY, ethnicity.into()));
        }
        attributes.push((keys::FIRST_LANGUAGE, language.into()));

        let education = city.pick_education(person.rng());
        let education_level = city.education_level(&education, person.rng());
        let income_level = city.income_level(record.household_income);
        let occupation = person.rand();
        let score = city.socioeconomic_score(income_level, education_level, occupation);
        attributes.push((keys::EDUCATION, education.into()));
        attributes.push((keys::EDUCATION_LEVEL, education_level.into()));
        attributes.push((keys::INCOME, record.income.into()));
        attributes.push((keys::INCOME_LEVEL, income_level.into()));
        attributes.push((keys::OCCUPATION_LEVEL, occupation.into()));
        attributes.push((keys::SOCIOECONOMIC_SCORE, score.into()));
        attributes.push((
            keys::SOCIOECONOMIC_CATEGORY,
            city.socioeconomic_category(score).into(),
        ));

        let birthdate = sample_birthdate(person.rng(), record.age, self.horizon)?;

        for (key, value) in attributes {
            person.set_attribute(key, value);
        }
        debug!(
            seed = person.seed,
            record = index,
            age = record.age,
            city = city.city(),
            "Demographics sampled"
        );
        Ok(birthdate)
    }
}

/// Attributes copied or looked up directly from a record.
fn resolve_record(record: &ReferenceRecord) -> Vec<(&'static str, AttributeValue)> {
    let mut attributes: Vec<(&'static str, AttributeValue)> = vec![
        (keys::REFERENCE_SERIAL_NO, record.serial_no.clone().into()),
        (keys::HOUSEHOLD_INCOME, record.household_income.into()),
        (keys::HOUSEHOLD_SIZE, record.household_size.into()),
        (keys::LONGITUDE, record.longitude.into()),
        (keys::LATITUDE, record.latitude.into()),
    ];

    let coded = [
        (keys::RACE, &codes::RACE, &record.race),
        (keys::GENDER, &codes::SEX, &record.sex),
        (keys::NATIVITY, &codes::NATIVITY, &record.nativity),
        (keys::BIRTHPLACE, &codes::BIRTHPLACE, &record.birthplace),
        (
            keys::SCHOOL_ENROLLMENT,
            &codes::SCHOOL_ENROLLMENT,
            &record.school_enrollment,
        ),
        (keys::GRADE_LEVEL, &codes::GRADE_LEVEL, &record.grade_level),
        (keys::RELATIONSHIP, &codes::RELATIONSHIP, &record.relationship),
        (
            keys::EMPLOYMENT_STATUS,
            &codes::EMPLOYMENT_STATUS,
            &record.employment_status,
        ),
    ];
    for (key, table, raw) in coded {
        if let Some(label) = table.resolve(raw) {
            attributes.push((key, label.into()));
        }
    }
    attributes
}

/// Last value pushed for `key`, as text.
fn lookup<'a>(attributes: &'a [(&'static str, AttributeValue)], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .rev()
        .find(|(k, _)| *k == key)
        .and_then(|(_, value)| value.as_text())
}

/// The `[earliest, latest]` birthdate window for someone `age` years old at
/// `horizon`: `[horizon - ((age + 1) * 365 + 1) days, horizon - age * 365 days]`.
pub fn birthdate_window(
    age: u32,
    horizon: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), DemographicsError> {
    let out_of_range = || DemographicsError::BirthdateOutOfRange { age };
    let years = i64::from(age);
    let latest_days = years.checked_mul(DAYS_PER_YEAR).ok_or_else(out_of_range)?;
    let earliest_days = years
        .checked_add(1)
        .and_then(|y| y.checked_mul(DAYS_PER_YEAR))
        .and_then(|d| d.checked_add(1))
        .ok_or_else(out_of_range)?;

    let earliest = TimeDelta::try_days(earliest_days)
        .and_then(|delta| horizon.checked_sub_signed(delta))
        .ok_or_else(out_of_range)?;
    let latest = TimeDelta::try_days(latest_days)
        .and_then(|delta| horizon.checked_sub_signed(delta))
        .ok_or_else(out_of_range)?;
    Ok((earliest, latest))
}

/// Draw a birthdate uniformly (millisecond resolution) within the window.
pub fn sample_birthdate<R: Rng + ?Sized>(
    rng: &mut R,
    age: u32,
    horizon: DateTime<Utc>,
) -> Result<DateTime<Utc>, DemographicsError> {
    let (earliest, latest) = birthdate_window(age, horizon)?;
    let millis = rng.random_range(earliest.timestamp_millis()..=latest.timestamp_millis());
    DateTime::from_timestamp_millis(millis).ok_or(DemographicsError::BirthdateOutOfRange { age })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::location::Location;

    const RECORDS: &str = r#"[
        {"SERIALNO": "H1", "AGEP": 30, "PINCP": 52000, "HINCP": 80000, "NP": 2,
         "RAC1P": "6", "HISP": "01", "SEX": "2", "POBP": "207", "SCH": "1",
         "SCHG": "NA", "RELP": "00", "ESR": "1", "NATIVITY": "2", "OCCP": "1010",
         "longitude": -71.1, "latitude": 42.37}
    ]"#;

    const HISPANIC_RECORD: &str = r#"[
        {"SERIALNO": "H2", "AGEP": 12, "RAC1P": "8", "HISP": "03", "SEX": "1",
         "SCH": "2", "SCHG": "16", "RELP": "2", "ESR": "", "NATIVITY": "1"}
    ]"#;

    fn horizon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap()
    }

    fn sampler(json: &str) -> DemographicSampler {
        DemographicSampler::new(Arc::new(ReferenceDataset::from_json(json).unwrap()), horizon())
    }

    #[test]
    fn birthdate_window_for_age_thirty() {
        let (earliest, latest) = birthdate_window(30, horizon()).unwrap();
        assert_eq!(earliest, horizon() - TimeDelta::days(31 * 365 + 1));
        assert_eq!(latest, horizon() - TimeDelta::days(30 * 365));

        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..500 {
            let birthdate = sample_birthdate(&mut rng, 30, horizon()).unwrap();
            assert!(birthdate >= earliest && birthdate <= latest);
        }
    }

    #[test]
    fn age_zero_window_ends_at_horizon() {
        let (_, latest) = birthdate_window(0, horizon()).unwrap();
        assert_eq!(latest, horizon());
    }

    #[test]
    fn non_hispanic_record_resolves_codes() {
        let location = Location::new("Massachusetts", Some("Boston")).unwrap();
        let city = location.random_city(&mut ChaCha8Rng::seed_from_u64(0)).unwrap();
        let mut person = Person::new(17, 1);
        let birthdate = sampler(RECORDS).sample(&mut person, city).unwrap();

        assert_eq!(person.text_attribute(keys::RACE), Some("asian"));
        assert_eq!(person.text_attribute(keys::GENDER), Some("F"));
        assert_eq!(person.text_attribute(keys::BIRTHPLACE), Some("China"));
        assert_eq!(person.text_attribute(keys::NATIVITY), Some("foreign_born"));
        assert_eq!(person.text_attribute(keys::RELATIONSHIP), Some("reference_person"));
        assert_eq!(
            person.text_attribute(keys::EMPLOYMENT_STATUS),
            Some("civilian_employed_at_work")
        );
        assert_eq!(person.text_attribute(keys::GRADE_LEVEL), Some("not_attending_school"));
        assert_eq!(person.text_attribute(keys::CITY), Some("Boston"));
        assert_eq!(
            person.attribute(keys::HISPANIC).and_then(AttributeValue::as_flag),
            Some(false)
        );
        let ethnicity = person.text_attribute(keys::ETHNICITY).unwrap();
        assert!(ethnicity == "chinese" || ethnicity == "asian_indian");
        assert!(person.attribute(keys::SOCIOECONOMIC_CATEGORY).is_some());

        let (earliest, latest) = birthdate_window(30, horizon()).unwrap();
        assert!(birthdate >= earliest && birthdate <= latest);
    }

    #[test]
    fn hispanic_origin_overrides_race() {
        let location = Location::new("Massachusetts", None).unwrap();
        let city = location.random_city(&mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        let mut person = Person::new(8, 1);
        sampler(HISPANIC_RECORD).sample(&mut person, city).unwrap();

        assert_eq!(person.text_attribute(keys::RACE), Some("hispanic"));
        assert_eq!(person.text_attribute(keys::ETHNICITY), Some("puerto_rican"));
        assert_eq!(
            person.text_attribute(keys::GRADE_LEVEL),
            Some("graduate_or_professional_school")
        );
        assert_eq!(person.text_attribute(keys::EMPLOYMENT_STATUS), Some("na_under_16"));
    }

    #[test]
    fn missing_hispanic_origin_sets_no_flag() {
        let record = r#"[{"SERIALNO": "H3", "AGEP": 40, "RAC1P": "1", "HISP": "NA", "SEX": "1"}]"#;
        let location = Location::new("Massachusetts", None).unwrap();
        let city = location.random_city(&mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        let mut person = Person::new(9, 1);
        sampler(record).sample(&mut person, city).unwrap();

        assert_eq!(person.text_attribute(keys::RACE), Some("white"));
        assert!(person.attribute(keys::HISPANIC).is_none());
        assert!(person.attribute(keys::ETHNICITY).is_none());
        assert!(person.text_attribute(keys::FIRST_LANGUAGE).is_some());
    }

    #[test]
    fn same_seed_same_attributes() {
        let location = Location::new("Massachusetts", None).unwrap();
        let city = location.random_city(&mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        let sampler = sampler(RECORDS);
        let mut a = Person::new(321, 9);
        let mut b = Person::new(321, 9);
        let da = sampler.sample(&mut a, city).unwrap();
        let db = sampler.sample(&mut b, city).unwrap();
        assert_eq!(da, db);
        assert_eq!(a.attributes, b.attributes);
    }

    #[test]
    fn unrepresentable_age_leaves_person_untouched() {
        let json = r#"[{"AGEP": 4000000000}]"#;
        let location = Location::new("Massachusetts", None).unwrap();
        let city = location.random_city(&mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        let mut person = Person::new(1, 1);
        let result = sampler(json).sample(&mut person, city);
        assert!(matches!(
            result,
            Err(DemographicsError::BirthdateOutOfRange { .. })
        ));
        assert!(person.attributes.is_empty());
    }
}

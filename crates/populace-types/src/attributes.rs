//! Person attribute keys and typed attribute values.
//!
//! Attributes are stored in a string-keyed map on each [`Person`] so that
//! demographic sampling, the life simulation, and the reporters can share
//! one open-ended vocabulary. The keys used by this workspace are the
//! constants in [`keys`].
//!
//! [`Person`]: crate::Person

use serde::{Deserialize, Serialize};

/// Well-known attribute keys.
pub mod keys {
    /// Full display name.
    pub const NAME: &str = "name";
    /// Birth date as an RFC 3339 timestamp.
    pub const BIRTHDATE: &str = "birthdate";
    /// City of residence.
    pub const CITY: &str = "city";
    /// State of residence.
    pub const STATE: &str = "state";
    /// "City, State" label of the run location.
    pub const LOCATION: &str = "location";
    /// Serial number of the reference record the person was drawn from.
    pub const REFERENCE_SERIAL_NO: &str = "reference_serial_no";
    /// Household income from the reference record.
    pub const HOUSEHOLD_INCOME: &str = "household_income";
    /// Household size from the reference record.
    pub const HOUSEHOLD_SIZE: &str = "household_size";
    /// Race category.
    pub const RACE: &str = "race";
    /// Whether the person is of Hispanic origin.
    pub const HISPANIC: &str = "hispanic";
    /// Ethnicity.
    pub const ETHNICITY: &str = "ethnicity";
    /// First language.
    pub const FIRST_LANGUAGE: &str = "first_language";
    /// Gender (`M` or `F`).
    pub const GENDER: &str = "gender";
    /// Longitude of residence.
    pub const LONGITUDE: &str = "longitude";
    /// Latitude of residence.
    pub const LATITUDE: &str = "latitude";
    /// Nativity (`native` or `foreign_born`).
    pub const NATIVITY: &str = "nativity";
    /// Place of birth.
    pub const BIRTHPLACE: &str = "birthplace";
    /// School enrollment status.
    pub const SCHOOL_ENROLLMENT: &str = "school_enrollment";
    /// Grade level attended.
    pub const GRADE_LEVEL: &str = "grade_level";
    /// Relationship to the household reference person.
    pub const RELATIONSHIP: &str = "relationship";
    /// Employment status.
    pub const EMPLOYMENT_STATUS: &str = "employment_status";
    /// Education category.
    pub const EDUCATION: &str = "education";
    /// Education score in `[0, 1]`.
    pub const EDUCATION_LEVEL: &str = "education_level";
    /// Personal income.
    pub const INCOME: &str = "income";
    /// Income score in `[0, 1]`.
    pub const INCOME_LEVEL: &str = "income_level";
    /// Occupation score in `[0, 1]`.
    pub const OCCUPATION_LEVEL: &str = "occupation_level";
    /// Combined socioeconomic score.
    pub const SOCIOECONOMIC_SCORE: &str = "socioeconomic_score";
    /// Socioeconomic category (`Low`, `Middle`, `High`).
    pub const SOCIOECONOMIC_CATEGORY: &str = "socioeconomic_category";
    /// Number of community health worker interventions received.
    pub const CHW_INTERVENTION: &str = "chw_intervention";
    /// Whether the person reached adulthood during the simulation.
    pub const ADULT: &str = "adult";
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A boolean flag.
    Flag(bool),
    /// A signed integer.
    Integer(i64),
    /// A floating point score or measurement.
    Float(f64),
    /// Free text or a categorical label.
    Text(String),
}

impl AttributeValue {
    /// Borrow the value as text, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The value as an integer, if it is one.
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// The value as a float; integers are widened.
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// The value as a flag, if it is one.
    pub const fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(value) => Some(*value),
            _ => None,
        }
    }
}

impl core::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Flag(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variants() {
        assert_eq!(AttributeValue::from("white").as_text(), Some("white"));
        assert_eq!(AttributeValue::from(3_u32).as_integer(), Some(3));
        assert_eq!(AttributeValue::from(true).as_flag(), Some(true));
        assert!(AttributeValue::from(true).as_text().is_none());
    }

    #[test]
    fn integers_widen_to_float() {
        let value = AttributeValue::from(4_i64);
        assert!(value.as_float().is_some_and(|v| (v - 4.0).abs() < f64::EPSILON));
    }

    #[test]
    fn display_is_bare_value() {
        assert_eq!(AttributeValue::from("M").to_string(), "M");
        assert_eq!(AttributeValue::from(12_i64).to_string(), "12");
    }
}

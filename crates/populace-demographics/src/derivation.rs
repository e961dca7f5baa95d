//! Composite demographic attributes derived per city.
//!
//! The [`DemographicDerivation`] trait is the seam the sampler talks to.
//! [`Demographics`] is the default implementation: one instance per city,
//! carrying that city's education distribution and income thresholds.
//!
//! # Education bands
//!
//! | Level          | Score band     |
//! |----------------|----------------|
//! | `less_than_hs` | `[0.0, 0.5)`   |
//! | `hs_degree`    | `[0.5, 0.75)`  |
//! | `some_college` | `[0.75, 0.9)`  |
//! | `bs_degree`    | `[0.9, 1.0]`   |
//!
//! # Socioeconomic score
//!
//! `0.2 * income + 0.7 * education + 0.1 * occupation`, categorized as
//! `Low` up to 0.33, `Middle` up to 0.66, and `High` above.

use rand::{Rng, RngCore};

/// Weight of the income level in the socioeconomic score.
const SES_INCOME_WEIGHT: f64 = 0.2;
/// Weight of the education level in the socioeconomic score.
const SES_EDUCATION_WEIGHT: f64 = 0.7;
/// Weight of the occupation level in the socioeconomic score.
const SES_OCCUPATION_WEIGHT: f64 = 0.1;

/// Upper bound of the `Low` socioeconomic category.
const SES_LOW_MAX: f64 = 0.33;
/// Upper bound of the `Middle` socioeconomic category.
const SES_MIDDLE_MAX: f64 = 0.66;

/// Language assumed when an ethnicity has no table entry.
const DEFAULT_LANGUAGE: &str = "english";
/// Ethnicity assumed when a race has no table entry.
const DEFAULT_ETHNICITY: &str = "american";

/// Lookups that turn resolved categorical attributes into composite ones.
///
/// Every randomized method draws from the attempt's random source only, so
/// the derived values are a pure function of the attempt seed.
pub trait DemographicDerivation: Send + Sync {
    /// City these derivations are keyed by.
    fn city(&self) -> &str;

    /// State the city belongs to.
    fn state(&self) -> &str;

    /// Pick an education category.
    fn pick_education(&self, rng: &mut dyn RngCore) -> String;

    /// Score an education category in `[0, 1]`.
    fn education_level(&self, level: &str, rng: &mut dyn RngCore) -> f64;

    /// Score a household income in `[0, 1]`.
    fn income_level(&self, income: i64) -> f64;

    /// Combine the three component scores.
    fn socioeconomic_score(&self, income_level: f64, education_level: f64, occupation: f64)
    -> f64;

    /// Categorize a socioeconomic score.
    fn socioeconomic_category(&self, score: f64) -> String;

    /// Pick an ethnicity for a non-Hispanic race.
    fn ethnicity_from_race(&self, race: &str, rng: &mut dyn RngCore) -> String;

    /// Pick a first language for an ethnicity.
    fn language_from_ethnicity(&self, ethnicity: Option<&str>, rng: &mut dyn RngCore) -> String;
}

/// Education distribution of one city, in per-mille weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EducationWeights {
    /// Did not finish high school.
    pub less_than_hs: u32,
    /// High school diploma.
    pub hs_degree: u32,
    /// Some college, no bachelor's degree.
    pub some_college: u32,
    /// Bachelor's degree or higher.
    pub bs_degree: u32,
}

impl EducationWeights {
    fn entries(self) -> [(&'static str, u32); 4] {
        [
            ("less_than_hs", self.less_than_hs),
            ("hs_degree", self.hs_degree),
            ("some_college", self.some_college),
            ("bs_degree", self.bs_degree),
        ]
    }
}

/// Default derivation service for one city.
#[derive(Debug, Clone, PartialEq)]
pub struct Demographics {
    /// City name.
    pub city: String,
    /// State name.
    pub state: String,
    /// Resident population, used to weight city selection.
    pub population: u32,
    /// Education distribution.
    pub education: EducationWeights,
    /// Household income at or below which the income level is 0.
    pub poverty_income: i64,
    /// Household income at or above which the income level is 1.
    pub high_income: i64,
}

/// Pick from `(value, weight)` entries with a cumulative weight walk.
///
/// Returns `None` when the table is empty or every weight is zero.
pub fn weighted_pick<'a>(entries: &[(&'a str, u32)], rng: &mut dyn RngCore) -> Option<&'a str> {
    let total = entries
        .iter()
        .fold(0_u32, |acc, (_, weight)| acc.saturating_add(*weight));
    if total == 0 {
        return None;
    }
    let roll = rng.next_u32().checked_rem(total).unwrap_or(0);
    let mut cumulative: u32 = 0;
    for &(value, weight) in entries {
        cumulative = cumulative.saturating_add(weight);
        if roll < cumulative {
            return Some(value);
        }
    }
    entries.last().map(|(value, _)| *value)
}

/// Ethnicity weights (percent) for a non-Hispanic race.
fn ethnicities_for(race: &str) -> &'static [(&'static str, u32)] {
    match race {
        "white" => &[
            ("irish", 22),
            ("italian", 14),
            ("english", 11),
            ("french", 8),
            ("german", 6),
            ("polish", 5),
            ("portuguese", 5),
            ("american", 5),
            ("french_canadian", 5),
            ("scottish", 4),
            ("russian", 4),
            ("swedish", 3),
            ("greek", 2),
            ("italian_american", 6),
        ],
        "black" => &[("african", 60), ("dominican", 10), ("west_indian", 30)],
        "asian" => &[("chinese", 55), ("asian_indian", 45)],
        "native" => &[("american_indian", 100)],
        "other" => &[("arab", 100)],
        _ => &[],
    }
}

/// First-language weights (percent) for an ethnicity.
fn languages_for(ethnicity: &str) -> &'static [(&'static str, u32)] {
    match ethnicity {
        "italian" => &[("italian", 20), ("english", 80)],
        "french" | "french_canadian" => &[("french", 25), ("english", 75)],
        "german" => &[("german", 15), ("english", 85)],
        "polish" => &[("polish", 25), ("english", 75)],
        "portuguese" => &[("portuguese", 45), ("english", 55)],
        "russian" => &[("russian", 50), ("english", 50)],
        "greek" => &[("greek", 30), ("english", 70)],
        "chinese" => &[("chinese", 70), ("english", 30)],
        "asian_indian" => &[("hindi", 40), ("english", 60)],
        "arab" => &[("arabic", 60), ("english", 40)],
        "west_indian" => &[("french_creole", 40), ("english", 60)],
        "mexican" | "puerto_rican" | "cuban" | "dominican" | "costa_rican" | "guatemalan"
        | "honduran" | "nicaraguan" | "panamanian" | "salvadoran" | "central_american"
        | "argentinean" | "bolivian" | "chilean" | "colombian" | "ecuadorian" | "paraguayan"
        | "peruvian" | "uruguayan" | "venezuelan" | "south_american" | "spaniard"
        | "other_hispanic" => &[("spanish", 75), ("english", 25)],
        _ => &[],
    }
}

/// Uniform draw in `[low, high)` from a trait-object random source.
fn uniform(rng: &mut dyn RngCore, low: f64, high: f64) -> f64 {
    let unit: f64 = rng.random();
    (high - low).mul_add(unit, low)
}

impl DemographicDerivation for Demographics {
    fn city(&self) -> &str {
        &self.city
    }

    fn state(&self) -> &str {
        &self.state
    }

    fn pick_education(&self, rng: &mut dyn RngCore) -> String {
        weighted_pick(&self.education.entries(), rng)
            .unwrap_or("hs_degree")
            .to_owned()
    }

    fn education_level(&self, level: &str, rng: &mut dyn RngCore) -> f64 {
        match level {
            "less_than_hs" => uniform(rng, 0.0, 0.5),
            "hs_degree" => uniform(rng, 0.5, 0.75),
            "some_college" => uniform(rng, 0.75, 0.9),
            "bs_degree" => uniform(rng, 0.9, 1.0),
            _ => 0.0,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn income_level(&self, income: i64) -> f64 {
        if income <= self.poverty_income {
            0.0
        } else if income >= self.high_income {
            1.0
        } else {
            let span = self.high_income.saturating_sub(self.poverty_income) as f64;
            let above = income.saturating_sub(self.poverty_income) as f64;
            above / span
        }
    }

    fn socioeconomic_score(
        &self,
        income_level: f64,
        education_level: f64,
        occupation: f64,
    ) -> f64 {
        SES_OCCUPATION_WEIGHT.mul_add(
            occupation,
            SES_INCOME_WEIGHT.mul_add(income_level, SES_EDUCATION_WEIGHT * education_level),
        )
    }

    fn socioeconomic_category(&self, score: f64) -> String {
        let label = if score <= SES_LOW_MAX {
            "Low"
        } else if score <= SES_MIDDLE_MAX {
            "Middle"
        } else {
            "High"
        };
        label.to_owned()
    }

    fn ethnicity_from_race(&self, race: &str, rng: &mut dyn RngCore) -> String {
        weighted_pick(ethnicities_for(race), rng)
            .unwrap_or(DEFAULT_ETHNICITY)
            .to_owned()
    }

    fn language_from_ethnicity(&self, ethnicity: Option<&str>, rng: &mut dyn RngCore) -> String {
        ethnicity
            .and_then(|ethnicity| weighted_pick(languages_for(ethnicity), rng))
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_owned()
    }
}

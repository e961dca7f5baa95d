//! Run location: a state and the cities people are placed in.

use rand::RngCore;

use crate::derivation::{Demographics, EducationWeights, weighted_pick};
use crate::error::DemographicsError;

/// State used when none is configured.
pub const DEFAULT_STATE: &str = "Massachusetts";

/// Household income treated as the poverty line.
const POVERTY_INCOME: i64 = 11_000;
/// Household income treated as high income.
const HIGH_INCOME: i64 = 75_000;

/// `(city, population, [less_than_hs, hs_degree, some_college, bs_degree])`
/// in per-mille education weights.
const MASSACHUSETTS_CITIES: &[(&str, u32, [u32; 4])] = &[
    ("Boston", 675_647, [140, 220, 150, 490]),
    ("Worcester", 206_518, [150, 290, 230, 330]),
    ("Springfield", 155_929, [230, 330, 240, 200]),
    ("Cambridge", 118_403, [60, 100, 90, 750]),
    ("Lowell", 115_554, [210, 310, 220, 260]),
    ("Brockton", 105_643, [170, 360, 250, 220]),
    ("Quincy", 101_636, [100, 250, 180, 470]),
    ("Lynn", 101_253, [220, 320, 220, 240]),
    ("New Bedford", 101_079, [290, 350, 200, 160]),
    ("Fall River", 94_000, [280, 360, 210, 150]),
];

/// A state and its population-weighted cities.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    state: String,
    /// Set when the run is pinned to one city.
    city: Option<String>,
    cities: Vec<Demographics>,
}

impl Location {
    /// Build the location for `state`, optionally pinned to one `city`.
    ///
    /// # Errors
    ///
    /// Returns [`DemographicsError::UnknownState`] when the state has no city
    /// table and [`DemographicsError::UnknownCity`] when the pinned city is not
    /// in the state.
    pub fn new(state: &str, city: Option<&str>) -> Result<Self, DemographicsError> {
        if !state.eq_ignore_ascii_case(DEFAULT_STATE) {
            return Err(DemographicsError::UnknownState {
                state: state.to_owned(),
            });
        }

        let mut cities: Vec<Demographics> = MASSACHUSETTS_CITIES
            .iter()
            .map(|&(name, population, [less, hs, some, bs])| Demographics {
                city: name.to_owned(),
                state: DEFAULT_STATE.to_owned(),
                population,
                education: EducationWeights {
                    less_than_hs: less,
                    hs_degree: hs,
                    some_college: some,
                    bs_degree: bs,
                },
                poverty_income: POVERTY_INCOME,
                high_income: HIGH_INCOME,
            })
            .collect();

        if let Some(wanted) = city {
            cities.retain(|c| c.city.eq_ignore_ascii_case(wanted));
            if cities.is_empty() {
                return Err(DemographicsError::UnknownCity {
                    city: wanted.to_owned(),
                    state: state.to_owned(),
                });
            }
        }

        Ok(Self {
            state: DEFAULT_STATE.to_owned(),
            city: city.map(str::to_owned),
            cities,
        })
    }

    /// State name.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// `"City, State"` when pinned to a city, otherwise just the state.
    pub fn label(&self) -> String {
        match (&self.city, self.cities.first()) {
            (Some(_), Some(city)) => format!("{}, {}", city.city, self.state),
            _ => self.state.clone(),
        }
    }

    /// Cities of this location.
    pub fn cities(&self) -> &[Demographics] {
        &self.cities
    }

    /// Pick a city weighted by population.
    pub fn random_city(&self, rng: &mut dyn RngCore) -> Option<&Demographics> {
        let weights: Vec<(&str, u32)> = self
            .cities
            .iter()
            .map(|city| (city.city.as_str(), city.population))
            .collect();
        let name = weighted_pick(&weights, rng)?;
        self.cities.iter().find(|city| city.city == name)
    }
}

//! The reference demographic dataset.
//!
//! The dataset is a JSON array of microdata-style records, loaded once per
//! run and shared read-only by every generation attempt. Field names match
//! the census public-use microdata columns.

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DemographicsError;

/// One row of the reference dataset.
///
/// Coded fields are kept as raw strings; they are resolved through the
/// tables in [`codes`](crate::codes) at sampling time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    /// Household serial number.
    #[serde(rename = "SERIALNO", default)]
    pub serial_no: String,
    /// Age in years at acquisition time.
    #[serde(rename = "AGEP")]
    pub age: u32,
    /// Personal income.
    #[serde(rename = "PINCP", default)]
    pub income: i64,
    /// Household income.
    #[serde(rename = "HINCP", default)]
    pub household_income: i64,
    /// Number of people in the household.
    #[serde(rename = "NP", default)]
    pub household_size: u32,
    /// Race code.
    #[serde(rename = "RAC1P", default)]
    pub race: String,
    /// Hispanic origin code.
    #[serde(rename = "HISP", default)]
    pub hispanic_origin: String,
    /// Sex code.
    #[serde(rename = "SEX", default)]
    pub sex: String,
    /// Place of birth code.
    #[serde(rename = "POBP", default)]
    pub birthplace: String,
    /// School enrollment code.
    #[serde(rename = "SCH", default)]
    pub school_enrollment: String,
    /// Grade level code.
    #[serde(rename = "SCHG", default)]
    pub grade_level: String,
    /// Relationship code.
    #[serde(rename = "RELP", default)]
    pub relationship: String,
    /// Employment status code.
    #[serde(rename = "ESR", default)]
    pub employment_status: String,
    /// Nativity code.
    #[serde(rename = "NATIVITY", default)]
    pub nativity: String,
    /// Occupation code. Carried but not yet mapped to an attribute.
    #[serde(rename = "OCCP", default)]
    pub occupation: String,
    /// Longitude of the household.
    #[serde(default)]
    pub longitude: f64,
    /// Latitude of the household.
    #[serde(default)]
    pub latitude: f64,
}

/// An immutable, non-empty collection of reference records.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceDataset {
    records: Vec<ReferenceRecord>,
}

impl ReferenceDataset {
    /// Build a dataset from records already in memory.
    ///
    /// # Errors
    ///
    /// Returns [`DemographicsError::EmptyDataset`] when `records` is empty.
    pub fn from_records(records: Vec<ReferenceRecord>) -> Result<Self, DemographicsError> {
        if records.is_empty() {
            return Err(DemographicsError::EmptyDataset);
        }
        Ok(Self { records })
    }

    /// Parse a dataset from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, DemographicsError> {
        let records: Vec<ReferenceRecord> = serde_json::from_str(json)?;
        Self::from_records(records)
    }

    /// Load a dataset from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, DemographicsError> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| DemographicsError::DatasetIo {
                path: path.to_path_buf(),
                source,
            })?;
        let dataset = Self::from_json(&contents)?;
        info!(
            path = %path.display(),
            records = dataset.len(),
            "Reference dataset loaded"
        );
        Ok(dataset)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always `false`; construction rejects empty datasets.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `index`.
    pub fn get(&self, index: usize) -> Option<&ReferenceRecord> {
        self.records.get(index)
    }

    /// Draw one record uniformly over `[0, len)`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<(usize, &ReferenceRecord), DemographicsError> {
        let index = rng.random_range(0..self.records.len().max(1));
        self.records
            .get(index)
            .map(|record| (index, record))
            .ok_or(DemographicsError::EmptyDataset)
    }
}

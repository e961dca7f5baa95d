//! JSON record export.
//!
//! [`JsonExporter`] writes one pretty-printed document per committed
//! person, named `<index>_<person-id>.json`, after trimming the health
//! record to the configured window of recent history. Once the run has
//! finished it writes the [`RunReport`] to `run_summary.json`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use tracing::{debug, info};

use populace_core::{ExportError, Exporter, RunReport};
use populace_types::Person;

use crate::error::StoreError;

/// File name of the post-completion summary.
pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

/// Exporter writing JSON documents to a directory.
#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
    years_of_history: u32,
}

impl JsonExporter {
    /// Create `output_dir` if needed and export into it, keeping
    /// `years_of_history` years of record before each export time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the directory cannot be created.
    pub fn new(output_dir: &Path, years_of_history: u32) -> Result<Self, StoreError> {
        std::fs::create_dir_all(output_dir).map_err(|e| StoreError::io(output_dir, e))?;
        info!(
            output_dir = %output_dir.display(),
            years_of_history,
            "JSON export enabled"
        );
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            years_of_history,
        })
    }

    /// The export directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the document for `person` at population `index`.
    pub fn person_path(&self, index: u32, person: &Person) -> PathBuf {
        self.output_dir.join(format!("{index}_{}.json", person.id))
    }

    /// Earliest record time kept for an export at `time`.
    pub fn history_cutoff(&self, time: DateTime<Utc>) -> DateTime<Utc> {
        time.checked_sub_months(Months::new(self.years_of_history.saturating_mul(12)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
        let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer
            .write_all(b"\n")
            .and_then(|()| writer.flush())
            .map_err(|e| StoreError::io(path, e))
    }
}

impl Exporter for JsonExporter {
    fn export(&self, index: u32, mut person: Person, time: DateTime<Utc>) -> Result<(), ExportError> {
        person.record.retain_since(self.history_cutoff(time));
        let path = self.person_path(index, &person);
        Self::write_json(&path, &person)?;
        debug!(index, path = %path.display(), "Person exported");
        Ok(())
    }

    fn finish(&self, report: &RunReport) -> Result<(), ExportError> {
        let path = self.output_dir.join(RUN_SUMMARY_FILE);
        Self::write_json(&path, report)?;
        info!(
            path = %path.display(),
            completed = report.results.len(),
            failed = report.failures.len(),
            "Run summary exported"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 3, 1, 0, 0, 0).single().unwrap()
    }

    #[test]
    fn cutoff_counts_back_whole_years() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path(), 10).unwrap();
        assert_eq!(exporter.history_cutoff(at(2024)), at(2014));
    }

    #[test]
    fn zero_years_keeps_only_the_present() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path(), 0).unwrap();
        assert_eq!(exporter.history_cutoff(at(2024)), at(2024));
    }

    #[test]
    fn file_names_carry_index_and_id() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path(), 1).unwrap();
        let person = Person::new(5, 6);
        let path = exporter.person_path(3, &person);
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some(format!("3_{}.json", person.id).as_str())
        );
    }
}

//! Console output for committed people and the end-of-run report.
//!
//! Each block is rendered into a `String` first and then written while
//! holding the output lock, so concurrent workers never interleave lines of
//! one person's summary with another's. The lock guard is scoped to the
//! write and released on every path, including write errors.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::warn;

use populace_types::{LogDetail, Person, keys};

use crate::metrics::TransitionMetrics;
use crate::stats::StatisticsSnapshot;

/// Serialized writer for console summaries.
pub struct Reporter {
    detail: LogDetail,
    out: Mutex<Box<dyn Write + Send>>,
}

impl core::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Reporter")
            .field("detail", &self.detail)
            .finish_non_exhaustive()
    }
}

impl Reporter {
    /// Reporter writing to `out`.
    pub fn new(detail: LogDetail, out: Box<dyn Write + Send>) -> Self {
        Self {
            detail,
            out: Mutex::new(out),
        }
    }

    /// Reporter writing to standard output.
    pub fn stdout(detail: LogDetail) -> Self {
        Self::new(detail, Box::new(std::io::stdout()))
    }

    /// Configured verbosity.
    pub const fn detail(&self) -> LogDetail {
        self.detail
    }

    /// Print the "Running with options" banner.
    pub fn banner(&self, population: u32, seed: u64, location: &str) {
        self.write_block(&format!(
            "Running with options:\nPopulation: {population}\nSeed: {seed}\nLocation: {location}\n\n"
        ));
    }

    /// Print one committed person's summary, if the verbosity asks for one.
    pub fn person_summary(&self, index: u32, person: &Person, time: DateTime<Utc>) {
        if let Some(block) = self.render_person(index, person, time) {
            self.write_block(&block);
        }
    }

    /// Render a person's summary block without writing it.
    pub fn render_person(&self, index: u32, person: &Person, time: DateTime<Utc>) -> Option<String> {
        if self.detail == LogDetail::None {
            return None;
        }

        let alive = person.alive(time);
        let mut block = format!(
            "{} -- {} ({} y/o) {}, {} {}\n",
            u64::from(index).saturating_add(1),
            person.text_attribute(keys::NAME).unwrap_or("unnamed"),
            person.age_in_years(time),
            person.text_attribute(keys::CITY).unwrap_or("unknown"),
            person.text_attribute(keys::STATE).unwrap_or("unknown"),
            if alive { "" } else { "DECEASED" }
        );

        if self.detail == LogDetail::Detailed {
            block.push_str("ATTRIBUTES\n");
            for (key, value) in &person.attributes {
                block.push_str(&format!("  * {key} = {value}\n"));
            }
            block.push_str(&format!("SYMPTOMS: {}\n", person.symptom_total()));
            block.push_str(&person.record.text_summary());
            block.push('\n');
            block.push_str("VITAL SIGNS\n");
            for (sign, value) in &person.vital_signs {
                block.push_str(&format!("  * {:>25} = {value:6.2}\n", sign.to_string()));
            }
            block.push_str(&format!(
                "Number of CHW Interventions: {}\n",
                person.chw_interventions()
            ));
            block.push_str("-----\n");
        }
        Some(block)
    }

    /// Print the final statistics and, when collected, transition metrics.
    pub fn final_report(&self, stats: &StatisticsSnapshot, metrics: Option<&TransitionMetrics>) {
        let mut block = format!("{stats}\n");
        if let Some(metrics) = metrics {
            block.push_str(&metrics.report(stats.total));
            block.push('\n');
        }
        self.write_block(&block);
    }

    /// Write a whole block under the output lock.
    pub fn write_block(&self, block: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = out.write_all(block.as_bytes()).and_then(|()| out.flush()) {
            warn!(error = %e, "failed to write console summary");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use populace_types::{Death, VitalSign};

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn at(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single().unwrap()
    }

    fn person() -> Person {
        let mut person = Person::new(3, 1);
        person.birthdate = Some(at(1990));
        person.set_attribute(keys::NAME, "Ada Lovelace");
        person.set_attribute(keys::CITY, "Boston");
        person.set_attribute(keys::STATE, "Massachusetts");
        person.set_attribute(keys::CHW_INTERVENTION, 2_i64);
        person.vital_signs.insert(VitalSign::Height, 170.0);
        person.symptoms.insert(String::from("cough"), 4);
        person
    }

    #[test]
    fn simple_summary_is_one_line() {
        let reporter = Reporter::new(LogDetail::Simple, Box::new(SharedBuffer::default()));
        let block = reporter.render_person(0, &person(), at(2020)).unwrap();
        assert_eq!(block, "1 -- Ada Lovelace (30 y/o) Boston, Massachusetts \n");
    }

    #[test]
    fn deceased_people_are_flagged() {
        let reporter = Reporter::new(LogDetail::Simple, Box::new(SharedBuffer::default()));
        let mut person = person();
        person.death = Some(Death {
            time: at(2010),
            cause: String::from("natural"),
        });
        let block = reporter.render_person(4, &person, at(2020)).unwrap();
        assert!(block.starts_with("5 -- Ada Lovelace"));
        assert!(block.trim_end().ends_with("DECEASED"));
    }

    #[test]
    fn detailed_summary_includes_everything() {
        let reporter = Reporter::new(LogDetail::Detailed, Box::new(SharedBuffer::default()));
        let block = reporter.render_person(0, &person(), at(2020)).unwrap();
        assert!(block.contains("ATTRIBUTES"));
        assert!(block.contains("  * city = Boston"));
        assert!(block.contains("SYMPTOMS: 4"));
        assert!(block.contains("RECORD: 0 encounters"));
        assert!(block.contains("VITAL SIGNS"));
        assert!(block.contains("HEIGHT = 170.00"));
        assert!(block.contains("Number of CHW Interventions: 2"));
        assert!(block.ends_with("-----\n"));
    }

    #[test]
    fn none_prints_nothing() {
        let buffer = SharedBuffer::default();
        let reporter = Reporter::new(LogDetail::None, Box::new(buffer.clone()));
        reporter.person_summary(0, &person(), at(2020));
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn concurrent_blocks_do_not_interleave() {
        let buffer = SharedBuffer::default();
        let reporter = Arc::new(Reporter::new(LogDetail::Detailed, Box::new(buffer.clone())));
        let handles: Vec<_> = (0..4_u32)
            .map(|worker| {
                let reporter = Arc::clone(&reporter);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        reporter.person_summary(worker, &person(), at(2020));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let contents = buffer.contents();
        let blocks: Vec<&str> = contents.split_terminator("-----\n").collect();
        assert_eq!(blocks.len(), 100);
        for block in blocks {
            assert_eq!(block.matches(" -- Ada Lovelace").count(), 1);
            assert!(block.contains("Number of CHW Interventions: 2"));
        }
    }

    #[test]
    fn final_report_prints_counts() {
        let buffer = SharedBuffer::default();
        let reporter = Reporter::new(LogDetail::Simple, Box::new(buffer.clone()));
        reporter.final_report(
            &StatisticsSnapshot {
                alive: 5,
                dead: 1,
                total: 6,
            },
            None,
        );
        assert!(buffer.contents().contains("alive: 5"));
    }
}

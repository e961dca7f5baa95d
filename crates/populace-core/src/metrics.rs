//! Module state-transition metrics for committed people.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use populace_types::Person;

/// How often one `(module, state)` pair was entered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    /// Times the state was entered across all people.
    pub entered: u64,
    /// Distinct people who entered the state.
    pub people: u64,
}

/// Thread-safe transition counters keyed by `(module, state)`.
#[derive(Debug, Default)]
pub struct TransitionMetrics {
    inner: Mutex<BTreeMap<(String, String), StateCounts>>,
}

impl TransitionMetrics {
    /// Create empty metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every transition in a committed person's history.
    pub fn record(&self, person: &Person) {
        let mut seen: BTreeSet<(&str, &str)> = BTreeSet::new();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        for transition in &person.history {
            let key = (transition.module.clone(), transition.state.clone());
            let counts = inner.entry(key).or_default();
            counts.entered = counts.entered.saturating_add(1);
            if seen.insert((&transition.module, &transition.state)) {
                counts.people = counts.people.saturating_add(1);
            }
        }
    }

    /// Counts for one pair.
    pub fn counts(&self, module: &str, state: &str) -> Option<StateCounts> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(module.to_owned(), state.to_owned()))
            .copied()
    }

    /// Printable report; `population` is the number of committed people.
    #[allow(clippy::cast_precision_loss)]
    pub fn report(&self, population: u64) -> String {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut out = String::from("Transition metrics:");
        let mut current_module: Option<&str> = None;
        for ((module, state), counts) in inner.iter() {
            if current_module != Some(module.as_str()) {
                out.push('\n');
                out.push_str(module);
                current_module = Some(module.as_str());
            }
            let share = if population == 0 {
                0.0
            } else {
                counts.people as f64 * 100.0 / population as f64
            };
            out.push_str(&format!(
                "\n  {state}: entered {} times by {} people ({share:.1}%)",
                counts.entered, counts.people
            ));
        }
        out
    }
}

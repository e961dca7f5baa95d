//! Run-scoped outcome counters.
//!
//! [`AggregateStatistics`] is shared by every worker. Counts per outcome and
//! the committed total live in one mutex-guarded struct so a reader never
//! sees `total != alive + dead`.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use populace_types::Outcome;

/// Thread-safe outcome counters. Safe to share via `Arc<AggregateStatistics>`.
#[derive(Debug, Default)]
pub struct AggregateStatistics {
    inner: Mutex<StatisticsInner>,
}

/// Counters held inside the mutex.
#[derive(Debug, Default, Clone)]
struct StatisticsInner {
    by_outcome: BTreeMap<Outcome, u64>,
    total: u64,
}

/// A consistent copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatisticsSnapshot {
    /// Committed people alive at the horizon.
    pub alive: u64,
    /// Committed people who died.
    pub dead: u64,
    /// All committed people.
    pub total: u64,
}

impl AggregateStatistics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one committed outcome.
    pub fn record(&self, outcome: Outcome) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let count = inner.by_outcome.entry(outcome).or_insert(0);
        *count = count.saturating_add(1);
        inner.total = inner.total.saturating_add(1);
    }

    /// Count for one outcome.
    pub fn count(&self, outcome: Outcome) -> u64 {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.by_outcome.get(&outcome).copied().unwrap_or(0)
    }

    /// Take a consistent snapshot.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        StatisticsSnapshot {
            alive: inner.by_outcome.get(&Outcome::Alive).copied().unwrap_or(0),
            dead: inner.by_outcome.get(&Outcome::Dead).copied().unwrap_or(0),
            total: inner.total,
        }
    }
}

impl core::fmt::Display for StatisticsSnapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "Statistics:")?;
        writeln!(f, "  {}: {}", Outcome::Alive, self.alive)?;
        writeln!(f, "  {}: {}", Outcome::Dead, self.dead)?;
        write!(f, "  total: {}", self.total)
    }
}

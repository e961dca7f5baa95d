//! Entries of the facility and health-worker registries.
//!
//! Both registries are append-only during a run. Utilization counters are
//! only ever raised by committed people, and the registries are persisted
//! once after every generation task has finished.

use serde::{Deserialize, Serialize};

use crate::ids::{FacilityId, HealthWorkerId};

/// A facility (hospital or clinic) that hosts encounters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    /// Registry identifier.
    pub id: FacilityId,
    /// Display name.
    pub name: String,
    /// City the facility serves.
    pub city: String,
    /// Encounters hosted by this facility.
    pub encounters: u64,
    /// Distinct committed people who visited.
    pub patients: u64,
}

/// A community health worker assigned to a city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthWorker {
    /// Registry identifier.
    pub id: HealthWorkerId,
    /// City the worker serves.
    pub city: String,
    /// Interventions delivered to committed people.
    pub interventions: u64,
}

//! Facility and community-health-worker registries.
//!
//! Registries are built once before dispatch and shared by every worker.
//! The life simulation only reads them (to pick a facility or a health
//! worker); utilization is tallied on the [`Person`] during an attempt and
//! applied here by [`Registries::apply_commit`] when the attempt commits.
//! Discarded attempts therefore never touch the registries.

use std::sync::{Mutex, PoisonError};

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use populace_demographics::Location;
use populace_types::{Facility, FacilityId, HealthWorker, HealthWorkerId, Person};

/// Facility name suffixes created for every city.
const FACILITY_KINDS: &[&str] = &["General Hospital", "Community Health Center"];

/// Most community health workers assigned to one city.
const MAX_WORKERS_PER_CITY: u32 = 3;

/// Shared, append-only registries.
#[derive(Debug, Default)]
pub struct Registries {
    facilities: Mutex<Vec<Facility>>,
    health_workers: Mutex<Vec<HealthWorker>>,
}

impl Registries {
    /// Create empty registries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build registries for every city of `location`.
    ///
    /// Identifiers and worker counts are drawn from a generator seeded with
    /// `seed`, so the registries are reproducible for a population seed.
    pub fn initialize(location: &Location, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let registries = Self::new();

        for city in location.cities() {
            for kind in FACILITY_KINDS {
                registries.add_facility(Facility {
                    id: FacilityId::from_u64_pair(rng.next_u64(), rng.next_u64()),
                    name: format!("{} {kind}", city.city),
                    city: city.city.clone(),
                    encounters: 0,
                    patients: 0,
                });
            }
            let workers = rng.random_range(1..=MAX_WORKERS_PER_CITY);
            for _ in 0..workers {
                registries.add_health_worker(HealthWorker {
                    id: HealthWorkerId::from_u64_pair(rng.next_u64(), rng.next_u64()),
                    city: city.city.clone(),
                    interventions: 0,
                });
            }
        }

        info!(
            facilities = registries.facilities().len(),
            health_workers = registries.health_workers().len(),
            location = %location.label(),
            "Registries initialized"
        );
        registries
    }

    /// Append a facility.
    pub fn add_facility(&self, facility: Facility) {
        self.facilities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(facility);
    }

    /// Append a health worker.
    pub fn add_health_worker(&self, worker: HealthWorker) {
        self.health_workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(worker);
    }

    /// Facilities serving `city`, in registry order.
    pub fn facilities_in(&self, city: &str) -> Vec<FacilityId> {
        self.facilities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|facility| facility.city == city)
            .map(|facility| facility.id)
            .collect()
    }

    /// Health workers serving `city`, in registry order.
    pub fn health_workers_in(&self, city: &str) -> Vec<HealthWorkerId> {
        self.health_workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|worker| worker.city == city)
            .map(|worker| worker.id)
            .collect()
    }

    /// Apply a committed person's facility visits and interventions.
    ///
    /// Visits to facilities not in the registry are ignored.
    pub fn apply_commit(&self, person: &Person) {
        if !person.facility_visits.is_empty() {
            let mut facilities = self.facilities.lock().unwrap_or_else(PoisonError::into_inner);
            for (id, visits) in &person.facility_visits {
                if let Some(facility) = facilities.iter_mut().find(|f| f.id == *id) {
                    facility.encounters = facility.encounters.saturating_add(u64::from(*visits));
                    facility.patients = facility.patients.saturating_add(1);
                }
            }
        }
        if !person.interventions.is_empty() {
            let mut workers = self
                .health_workers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            for (id, count) in &person.interventions {
                if let Some(worker) = workers.iter_mut().find(|w| w.id == *id) {
                    worker.interventions = worker.interventions.saturating_add(u64::from(*count));
                }
            }
        }
    }

    /// Copy of the facility registry.
    pub fn facilities(&self) -> Vec<Facility> {
        self.facilities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Copy of the health-worker registry.
    pub fn health_workers(&self) -> Vec<HealthWorker> {
        self.health_workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn location() -> Location {
        Location::new("Massachusetts", None).unwrap()
    }

    #[test]
    fn every_city_gets_facilities_and_workers() {
        let location = location();
        let registries = Registries::initialize(&location, 7);
        for city in location.cities() {
            assert_eq!(registries.facilities_in(&city.city).len(), FACILITY_KINDS.len());
            let workers = registries.health_workers_in(&city.city).len();
            assert!((1..=3).contains(&workers));
        }
    }

    #[test]
    fn initialization_is_seed_deterministic() {
        let location = location();
        let a = Registries::initialize(&location, 99);
        let b = Registries::initialize(&location, 99);
        assert_eq!(a.facilities(), b.facilities());
        assert_eq!(a.health_workers(), b.health_workers());
    }

    #[test]
    fn commit_applies_person_tallies() {
        let registries = Registries::initialize(&location(), 1);
        let facility = registries.facilities_in("Boston")[0];
        let worker = registries.health_workers_in("Boston")[0];

        let mut person = Person::new(5, 1);
        person.facility_visits.insert(facility, 3);
        person.interventions.insert(worker, 2);
        registries.apply_commit(&person);
        registries.apply_commit(&person);

        let stored = registries
            .facilities()
            .into_iter()
            .find(|f| f.id == facility)
            .unwrap();
        assert_eq!(stored.encounters, 6);
        assert_eq!(stored.patients, 2);
        let stored = registries
            .health_workers()
            .into_iter()
            .find(|w| w.id == worker)
            .unwrap();
        assert_eq!(stored.interventions, 4);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let registries = Registries::new();
        let mut person = Person::new(5, 1);
        person.facility_visits.insert(FacilityId::from_u64_pair(0, u64::MAX), 1);
        registries.apply_commit(&person);
        assert!(registries.facilities().is_empty());
    }
}

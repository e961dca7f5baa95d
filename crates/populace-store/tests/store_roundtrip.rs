//! File store and exporter behavior against a real temporary directory.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use populace_core::{Exporter, IndexFailure, PersistenceStore, RunReport, StatisticsSnapshot};
use populace_store::{
    FileStore, HEALTH_WORKERS_FILE, JsonExporter, PERSONS_FILE, RUN_SUMMARY_FILE, StoreError,
    open_store, read_jsonl,
};
use populace_types::{
    Encounter, EncounterKind, HealthWorker, HealthWorkerId, PersistenceMode, Person,
};

fn at(year: i32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single().unwrap()
}

fn wellness(year: i32) -> Encounter {
    Encounter {
        time: at(year),
        kind: EncounterKind::Wellness,
        facility: None,
        health_worker: None,
        description: String::from("Annual wellness visit"),
    }
}

#[test]
fn concurrent_person_writes_stay_line_delimited() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path()).unwrap());

    let handles: Vec<_> = (0..8_u64)
        .map(|worker| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..25_u64 {
                    let mut person = Person::new(worker * 100 + i, 42);
                    person.record.encounters.push(wellness(2000));
                    store.store_person(&person).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let persons: Vec<Value> = read_jsonl(&dir.path().join(PERSONS_FILE)).unwrap();
    assert_eq!(persons.len(), 200);
    assert!(persons.iter().all(|p| p["population_seed"] == 42));
    assert!(persons.iter().all(|p| p["record"]["encounters"].as_array().map(Vec::len) == Some(1)));
}

#[test]
fn file_mode_store_writes_registries() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(PersistenceMode::File, &dir.path().join("db"))
        .unwrap()
        .unwrap();
    let worker = HealthWorker {
        id: HealthWorkerId::from_u64_pair(3, 4),
        city: String::from("Worcester"),
        interventions: 9,
    };
    store.store_health_workers(std::slice::from_ref(&worker)).unwrap();

    let read: Vec<HealthWorker> =
        read_jsonl(&dir.path().join("db").join(HEALTH_WORKERS_FILE)).unwrap();
    assert_eq!(read, vec![worker]);
}

#[test]
fn reading_a_missing_file_reports_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.jsonl");
    let err = read_jsonl::<Value>(&missing).unwrap_err();
    assert!(matches!(err, StoreError::Io { ref path, .. } if *path == missing));
}

#[test]
fn export_trims_history_to_the_window() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = JsonExporter::new(dir.path(), 5).unwrap();

    let mut person = Person::new(7, 42);
    for year in [2000, 2015, 2020, 2023] {
        person.record.encounters.push(wellness(year));
    }
    let path = exporter.person_path(0, &person);
    exporter.export(0, person, at(2024)).unwrap();

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    let encounters = doc["record"]["encounters"].as_array().unwrap();
    assert_eq!(encounters.len(), 2);
    assert_eq!(doc["seed"], 7);
}

#[test]
fn finish_writes_the_run_summary() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = JsonExporter::new(dir.path(), 5).unwrap();
    let report = RunReport {
        population: 2,
        seed: 42,
        location: String::from("Massachusetts"),
        results: Vec::new(),
        failures: vec![IndexFailure {
            index: 1,
            seed: 99,
            error: String::from("simulation failed"),
        }],
        statistics: StatisticsSnapshot {
            alive: 1,
            dead: 0,
            total: 1,
        },
    };
    exporter.finish(&report).unwrap();

    let summary: Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join(RUN_SUMMARY_FILE)).unwrap(),
    )
    .unwrap();
    assert_eq!(summary["population"], 2);
    assert_eq!(summary["statistics"]["total"], 1);
    assert_eq!(summary["failures"][0]["seed"], 99);
}

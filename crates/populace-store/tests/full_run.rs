//! A complete run with the default life engine, file store, and exporter.

#![allow(clippy::unwrap_used, clippy::cast_possible_truncation)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, TimeZone, Utc};
use serde_json::Value;

use populace_core::{
    Collaborators, Dispatcher, Generator, LifecycleConfig, Registries, Reporter, RunConfig,
    RunReport, SeedManager,
};
use populace_demographics::{DemographicSampler, Location, ReferenceDataset};
use populace_lifecycle::LifeEngine;
use populace_store::{
    FACILITIES_FILE, JsonExporter, PERSONS_FILE, RUN_SUMMARY_FILE, open_store, read_jsonl,
};
use populace_types::{Facility, LogDetail, OutcomeFilter, PersistenceMode};

const DATASET: &str = r#"[
    {"SERIALNO": "10", "AGEP": 2, "HINCP": 52000, "NP": 4, "RAC1P": "1", "HISP": "01", "SEX": "2"},
    {"SERIALNO": "11", "AGEP": 27, "HINCP": 64000, "NP": 2, "RAC1P": "6", "HISP": "01", "SEX": "1"},
    {"SERIALNO": "12", "AGEP": 48, "HINCP": 23000, "NP": 3, "RAC1P": "2", "HISP": "01", "SEX": "2"},
    {"SERIALNO": "13", "AGEP": 73, "HINCP": 31000, "NP": 1, "RAC1P": "1", "HISP": "04", "SEX": "1"}
]"#;

fn run(root: &Path, population: u32, workers: usize) -> (RunReport, Arc<Registries>) {
    let config = RunConfig {
        population,
        seed: 2024,
        horizon: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap(),
        timestep: TimeDelta::days(30),
        filter: OutcomeFilter::PreferAlive,
        workers,
        persistence: PersistenceMode::File,
        database_path: root.join("db"),
        log_detail: LogDetail::None,
        track_transition_metrics: true,
        max_attempts: None,
        wait_log_interval: Duration::from_millis(100),
    };
    let location = Location::new("Massachusetts", None).unwrap();
    let registries = Arc::new(Registries::initialize(
        &location,
        SeedManager::new(config.seed).registry_seed(),
    ));
    let dataset = Arc::new(ReferenceDataset::from_json(DATASET).unwrap());
    let sampler = DemographicSampler::new(dataset, config.horizon);
    let collaborators = Collaborators {
        simulator: Arc::new(
            LifeEngine::new(LifecycleConfig::default(), Arc::clone(&registries)).unwrap(),
        ),
        store: open_store(config.persistence, &config.database_path).unwrap(),
        exporter: Arc::new(JsonExporter::new(&root.join("export"), 10).unwrap()),
        registries: Arc::clone(&registries),
    };
    let reporter = Reporter::new(config.log_detail, Box::new(std::io::sink()));
    let generator = Generator::new(config, location, sampler, collaborators, reporter);
    let report = Dispatcher::new(Arc::new(generator)).run().unwrap();
    (report, registries)
}

#[test]
fn every_commit_is_persisted_and_exported() {
    let dir = tempfile::tempdir().unwrap();
    let (report, registries) = run(dir.path(), 6, 3);
    let stats = report.statistics;

    assert!(report.failures.is_empty());
    assert_eq!(stats.alive, 6);
    assert_eq!(stats.total, stats.alive + stats.dead);

    let persons: Vec<Value> = read_jsonl(&dir.path().join("db").join(PERSONS_FILE)).unwrap();
    assert_eq!(persons.len() as u64, stats.total);

    // Registry utilization equals the visits of committed people only.
    let visits: u64 = persons
        .iter()
        .filter_map(|p| p["facility_visits"].as_object())
        .flat_map(|m| m.values())
        .filter_map(Value::as_u64)
        .sum();
    let facilities: Vec<Facility> =
        read_jsonl(&dir.path().join("db").join(FACILITIES_FILE)).unwrap();
    assert_eq!(facilities.iter().map(|f| f.encounters).sum::<u64>(), visits);
    assert_eq!(facilities, registries.facilities());

    let exported = std::fs::read_dir(dir.path().join("export"))
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name() != RUN_SUMMARY_FILE)
        .count();
    assert_eq!(exported as u64, stats.total);
    assert!(dir.path().join("export").join(RUN_SUMMARY_FILE).exists());
}

#[test]
fn runs_are_reproducible_across_worker_counts() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let (one, _) = run(a.path(), 5, 1);
    let (many, _) = run(b.path(), 5, 4);

    assert_eq!(one.results, many.results);
    assert_eq!(one.statistics, many.statistics);
}

//! Persistence stores for committed people and the registries.
//!
//! Two backends implement [`PersistenceStore`]:
//!
//! - [`MemoryStore`] keeps everything in mutex-guarded vectors and exposes
//!   read accessors.
//! - [`FileStore`] appends one JSON document per line to `persons.jsonl`,
//!   `facilities.jsonl`, and `health_workers.jsonl` under a directory. Each
//!   file has its own lock and is flushed after every call.
//!
//! [`open_store`] picks the backend for a [`PersistenceMode`]; `none`
//! yields no store at all.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use populace_core::{PersistError, PersistenceStore};
use populace_types::{Facility, HealthWorker, PersistenceMode, Person};

use crate::error::StoreError;

/// File name of the person log.
pub const PERSONS_FILE: &str = "persons.jsonl";
/// File name of the facility registry.
pub const FACILITIES_FILE: &str = "facilities.jsonl";
/// File name of the health-worker registry.
pub const HEALTH_WORKERS_FILE: &str = "health_workers.jsonl";

/// Open the store for `mode`, rooted at `path` for file stores.
///
/// # Errors
///
/// Returns [`StoreError::Io`] when the file store's directory or files
/// cannot be created.
pub fn open_store(
    mode: PersistenceMode,
    path: &Path,
) -> Result<Option<Arc<dyn PersistenceStore>>, StoreError> {
    let store: Option<Arc<dyn PersistenceStore>> = match mode {
        PersistenceMode::InMemory => Some(Arc::new(MemoryStore::new())),
        PersistenceMode::File => Some(Arc::new(FileStore::open(path)?)),
        PersistenceMode::None => None,
    };
    info!(mode = %mode, path = %path.display(), "Persistence store opened");
    Ok(store)
}

// -----------------------------------------------------------------------
// In-memory
// -----------------------------------------------------------------------

/// Store holding persisted entities in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    persons: Mutex<Vec<Person>>,
    facilities: Mutex<Vec<Facility>>,
    health_workers: Mutex<Vec<HealthWorker>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every persisted person, in commit order.
    pub fn persons(&self) -> Vec<Person> {
        self.persons
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of persisted people.
    pub fn person_count(&self) -> usize {
        self.persons
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Copy of the persisted facility registry.
    pub fn facilities(&self) -> Vec<Facility> {
        self.facilities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Copy of the persisted health-worker registry.
    pub fn health_workers(&self) -> Vec<HealthWorker> {
        self.health_workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PersistenceStore for MemoryStore {
    fn store_person(&self, person: &Person) -> Result<(), PersistError> {
        self.persons
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(person.clone());
        Ok(())
    }

    fn store_facilities(&self, facilities: &[Facility]) -> Result<(), PersistError> {
        self.facilities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(facilities);
        Ok(())
    }

    fn store_health_workers(&self, workers: &[HealthWorker]) -> Result<(), PersistError> {
        self.health_workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(workers);
        Ok(())
    }
}

// -----------------------------------------------------------------------
// Newline-delimited JSON files
// -----------------------------------------------------------------------

/// One append-only JSON lines file.
#[derive(Debug)]
struct JsonLines {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonLines {
    fn create(path: PathBuf) -> Result<Self, StoreError> {
        let file = File::create(&path).map_err(|e| StoreError::io(&path, e))?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Encode every item, then write and flush them under one lock.
    fn append<T: Serialize>(&self, items: &[T]) -> Result<(), StoreError> {
        let mut buf = Vec::new();
        for item in items {
            serde_json::to_writer(&mut buf, item)?;
            buf.push(b'\n');
        }
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer
            .write_all(&buf)
            .and_then(|()| writer.flush())
            .map_err(|e| StoreError::io(&self.path, e))
    }
}

/// Store appending entities to JSON lines files under a directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    persons: JsonLines,
    facilities: JsonLines,
    health_workers: JsonLines,
}

impl FileStore {
    /// Create `dir` if needed and start fresh files in it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the directory or a file cannot be
    /// created.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            persons: JsonLines::create(dir.join(PERSONS_FILE))?,
            facilities: JsonLines::create(dir.join(FACILITIES_FILE))?,
            health_workers: JsonLines::create(dir.join(HEALTH_WORKERS_FILE))?,
        })
    }

    /// The store's directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PersistenceStore for FileStore {
    fn store_person(&self, person: &Person) -> Result<(), PersistError> {
        Ok(self.persons.append(std::slice::from_ref(person))?)
    }

    fn store_facilities(&self, facilities: &[Facility]) -> Result<(), PersistError> {
        Ok(self.facilities.append(facilities)?)
    }

    fn store_health_workers(&self, workers: &[HealthWorker]) -> Result<(), PersistError> {
        Ok(self.health_workers.append(workers)?)
    }
}

/// Read a JSON lines file back, skipping blank lines.
///
/// # Errors
///
/// Returns [`StoreError::Io`] when the file cannot be read and
/// [`StoreError::Serialization`] when a line does not decode as `T`.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let mut items = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| StoreError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        items.push(serde_json::from_str(&line)?);
    }
    Ok(items)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use populace_types::FacilityId;

    use super::*;

    fn facility(name: &str) -> Facility {
        Facility {
            id: FacilityId::from_u64_pair(1, 2),
            name: name.to_owned(),
            city: String::from("Boston"),
            encounters: 3,
            patients: 1,
        }
    }

    #[test]
    fn none_mode_opens_no_store() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open_store(PersistenceMode::None, dir.path()).unwrap().is_none());
    }

    #[test]
    fn memory_store_keeps_everything() {
        let store = MemoryStore::new();
        store.store_person(&Person::new(1, 1)).unwrap();
        store.store_person(&Person::new(2, 1)).unwrap();
        store.store_facilities(&[facility("A")]).unwrap();

        assert_eq!(store.person_count(), 2);
        assert_eq!(store.persons()[1].seed, 2);
        assert_eq!(store.facilities(), vec![facility("A")]);
        assert!(store.health_workers().is_empty());
    }

    #[test]
    fn file_store_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(&dir.path().join("db")).unwrap();
        store.store_facilities(&[facility("A"), facility("B")]).unwrap();

        let read: Vec<Facility> = read_jsonl(&store.dir().join(FACILITIES_FILE)).unwrap();
        assert_eq!(read, vec![facility("A"), facility("B")]);
    }
}

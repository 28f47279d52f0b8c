//! Whole-document persistence for the ledger.
//!
//! The ledger always reads a fresh snapshot before a mutation and writes the
//! complete state back, relying on the store for atomicity of each save.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::person::Person;

/// Complete persisted ledger state. Persons keep insertion order; the roster
/// and occupancy views rely on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerState {
    #[serde(default)]
    pub persons: Vec<Person>,
}

/// Atomic load/save of the full ledger document.
pub trait RecordStore: Send + Sync {
    fn load(&self) -> LedgerResult<LedgerState>;
    fn save(&self, state: &LedgerState) -> LedgerResult<()>;
}

/// JSON document store. Each save writes a temp file in the same directory
/// and renames it over the previous document, so readers never observe a
/// partial write.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self) -> LedgerResult<LedgerState> {
        if !self.path.exists() {
            return Ok(LedgerState::default());
        }

        let raw = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    fn save(&self, state: &LedgerState) -> LedgerResult<()> {
        let dir = self.parent_dir();
        std::fs::create_dir_all(dir)?;

        let json = serde_json::to_string_pretty(state)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&self.path)
            .map_err(|e| LedgerError::Store(e.to_string()))?;

        Ok(())
    }
}

/// In-memory store used by ledger tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryStore {
    state: std::sync::Mutex<LedgerState>,
}

#[cfg(test)]
impl RecordStore for MemoryStore {
    fn load(&self) -> LedgerResult<LedgerState> {
        Ok(self.state.lock().unwrap().clone())
    }

    fn save(&self, state: &LedgerState) -> LedgerResult<()> {
        *self.state.lock().unwrap() = state.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::{Person, VacationRecord};

    fn sample_state() -> LedgerState {
        LedgerState {
            persons: vec![Person {
                id: "p1".into(),
                name: "Jane Doe".into(),
                email: "jane@example.com".into(),
                team: Some("Eng".into()),
                birthday: Some("1990-06-15".parse().unwrap()),
                hiring_date: None,
                total_vacation_days: 25,
                vacations: vec![VacationRecord {
                    id: "v1".into(),
                    start_date: "2025-06-01".parse().unwrap(),
                    end_date: "2025-06-05".parse().unwrap(),
                    days_used: 4,
                    external_event_id: Some("evt-1".into()),
                }],
            }],
        }
    }

    #[test]
    fn missing_file_loads_as_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("ledger.json"));
        assert!(store.load().unwrap().persons.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("ledger.json"));

        store.save(&sample_state()).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.persons.len(), 1);
        let person = &loaded.persons[0];
        assert_eq!(person.name, "Jane Doe");
        assert_eq!(person.vacations[0].days_used, 4);
        assert_eq!(person.vacations[0].external_event_id.as_deref(), Some("evt-1"));
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/data/ledger.json"));

        store.save(&sample_state()).unwrap();
        assert_eq!(store.load().unwrap().persons.len(), 1);
    }
}

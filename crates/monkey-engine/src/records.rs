//! High score and the top-scores list.
//!
//! Persistence goes through the small [`RecordStore`] key/value trait so the
//! core does not care whether scores live in browser storage, a file, or
//! memory. Two keys are used: `highScore` (an integer) and `records` (a JSON
//! array of `{score, date}`, best first, at most five entries).

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::TowerError;

pub const HIGH_SCORE_KEY: &str = "highScore";
pub const RECORDS_KEY: &str = "records";

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// String key/value persistence.
pub trait RecordStore {
    fn get(&self, key: &str) -> Result<Option<String>, TowerError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), TowerError>;
    fn remove(&mut self, key: &str) -> Result<(), TowerError>;
}

/// In-memory store. Used by tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, TowerError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), TowerError> {
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), TowerError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk. A missing file reads as
/// empty.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, TowerError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), TowerError> {
        let text = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, TowerError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), TowerError> {
        let mut values = self.read_all()?;
        values.insert(key.to_owned(), value.to_owned());
        self.write_all(&values)
    }

    fn remove(&mut self, key: &str) -> Result<(), TowerError> {
        let mut values = self.read_all()?;
        if values.remove(key).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScoreBoard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub score: u32,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBoard {
    high_score: u32,
    records: Vec<ScoreRecord>,
    max_records: usize,
}

impl ScoreBoard {
    pub fn new(max_records: usize) -> Self {
        Self {
            high_score: 0,
            records: Vec::new(),
            max_records,
        }
    }

    /// Read both keys from `store`.
    pub fn load(store: &dyn RecordStore, max_records: usize) -> Result<Self, TowerError> {
        let high_score = match store.get(HIGH_SCORE_KEY)? {
            Some(raw) => raw.trim().parse().unwrap_or(0),
            None => 0,
        };
        let mut records: Vec<ScoreRecord> = match store.get(RECORDS_KEY)? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };
        records.sort_by(|a, b| b.score.cmp(&a.score));
        records.truncate(max_records);
        Ok(Self {
            high_score,
            records,
            max_records,
        })
    }

    /// Like [`ScoreBoard::load`], but a broken store yields an empty board.
    pub fn load_or_default(store: &dyn RecordStore, max_records: usize) -> Self {
        Self::load(store, max_records).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load score records");
            Self::new(max_records)
        })
    }

    pub fn save(&self, store: &mut dyn RecordStore) -> Result<(), TowerError> {
        store.set(HIGH_SCORE_KEY, &self.high_score.to_string())?;
        store.set(RECORDS_KEY, &serde_json::to_string(&self.records)?)?;
        Ok(())
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Best first.
    pub fn records(&self) -> &[ScoreRecord] {
        &self.records
    }

    /// Register a running score. Only a new high score is recorded.
    ///
    /// Returns `true` if the board changed and should be saved.
    pub fn record_score(&mut self, score: u32, date: &str) -> bool {
        if score <= self.high_score {
            return false;
        }
        self.high_score = score;
        self.records.push(ScoreRecord {
            score,
            date: date.to_owned(),
        });
        // Stable sort keeps earlier entries first among equal scores.
        self.records.sort_by(|a, b| b.score.cmp(&a.score));
        self.records.truncate(self.max_records);
        true
    }

    /// Wipe the board and both store keys.
    pub fn clear(&mut self, store: &mut dyn RecordStore) -> Result<(), TowerError> {
        self.high_score = 0;
        self.records.clear();
        store.remove(RECORDS_KEY)?;
        store.remove(HIGH_SCORE_KEY)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

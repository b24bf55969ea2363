//! Pattern persistence.
//!
//! The learner writes its whole table through a `PatternStore` after every
//! update and reads it back once at startup.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{PreloadError, Result};
use crate::patterns::TransitionRecord;

// == Pattern Store ==
/// Durable storage for learned transitions.
///
/// Failures are reported, never panicked on; callers decide whether to
/// degrade (the learner always does).
pub trait PatternStore: Send + Sync {
    /// Reads the persisted table. A store that was never written returns an
    /// empty list.
    fn read(&self) -> Result<Vec<TransitionRecord>>;

    /// Replaces the persisted table.
    fn write(&self, records: &[TransitionRecord]) -> Result<()>;
}

// == Memory Pattern Store ==
/// Process-local store, for tests and hosts without durable storage.
#[derive(Debug, Default)]
pub struct MemoryPatternStore {
    records: Mutex<Vec<TransitionRecord>>,
}

impl MemoryPatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with `records`.
    pub fn with_records(records: Vec<TransitionRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Snapshot of what has been written.
    pub fn records(&self) -> Vec<TransitionRecord> {
        self.records.lock().clone()
    }
}

impl PatternStore for MemoryPatternStore {
    fn read(&self) -> Result<Vec<TransitionRecord>> {
        Ok(self.records.lock().clone())
    }

    fn write(&self, records: &[TransitionRecord]) -> Result<()> {
        *self.records.lock() = records.to_vec();
        Ok(())
    }
}

// == Json File Pattern Store ==
/// Stores the table as a JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonFilePatternStore {
    path: PathBuf,
}

impl JsonFilePatternStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PatternStore for JsonFilePatternStore {
    fn read(&self) -> Result<Vec<TransitionRecord>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(PreloadError::Persistence(format!(
                    "reading {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw).map_err(|e| {
            PreloadError::Persistence(format!("parsing {}: {}", self.path.display(), e))
        })
    }

    fn write(&self, records: &[TransitionRecord]) -> Result<()> {
        let json = serde_json::to_vec(records)
            .map_err(|e| PreloadError::Persistence(format!("serializing patterns: {}", e)))?;

        // Sibling file + rename: the table on disk is always complete
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, &self.path))
            .map_err(|e| {
                PreloadError::Persistence(format!("writing {}: {}", self.path.display(), e))
            })
    }
}

//! Best-record storage behind a small trait.
//!
//! The simulation only reports a finished run; where the record lives is up
//! to the store.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("record file is corrupt: {0}")]
    Format(#[from] serde_json::Error),
}

/// Best level and survival time reached so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BestRecord {
    pub level: u32,
    pub time: f32,
}

impl BestRecord {
    /// Merge a finished run. Returns true if either best improved.
    pub fn merge(&mut self, level: u32, time: f32) -> bool {
        let mut improved = false;
        if level > self.level {
            self.level = level;
            improved = true;
        }
        if time.is_finite() && time > self.time {
            self.time = time;
            improved = true;
        }
        improved
    }
}

pub trait BestRecordStore {
    fn best_level(&self) -> u32;

    fn best_time(&self) -> f32;

    /// Record a finished run, saving if it beats the stored bests.
    /// Returns true when a new record was saved.
    fn check_and_save(&mut self, level: u32, time: f32) -> Result<bool, RecordError>;
}

/// In-process store, mostly for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    record: BestRecord,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BestRecordStore for MemoryRecordStore {
    fn best_level(&self) -> u32 {
        self.record.level
    }

    fn best_time(&self) -> f32 {
        self.record.time
    }

    fn check_and_save(&mut self, level: u32, time: f32) -> Result<bool, RecordError> {
        Ok(self.record.merge(level, time))
    }
}

/// Store that keeps the record in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileRecordStore {
    path: PathBuf,
    record: BestRecord,
}

impl JsonFileRecordStore {
    /// Open the store at `path`. A missing file starts from an empty record.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref().to_path_buf();
        let record = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BestRecord::default(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, record })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), RecordError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.record)?)?;
        Ok(())
    }
}

impl BestRecordStore for JsonFileRecordStore {
    fn best_level(&self) -> u32 {
        self.record.level
    }

    fn best_time(&self) -> f32 {
        self.record.time
    }

    fn check_and_save(&mut self, level: u32, time: f32) -> Result<bool, RecordError> {
        if !self.record.merge(level, time) {
            return Ok(false);
        }
        self.save()?;
        log::info!("New best record: level {}, {:.1}s", self.record.level, self.record.time);
        Ok(true)
    }
}

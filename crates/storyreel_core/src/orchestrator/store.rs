//! Persisted run state with atomic writes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::PipelineRun;

/// Run state format version.
const RUN_STATE_VERSION: u32 = 1;

/// Versioned envelope saved to run.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RunEnvelope {
    /// Run state format version.
    version: u32,
    /// The persisted run.
    run: PipelineRun,
}

/// Persists a [`PipelineRun`] at `<run_dir>/run.json`.
///
/// Writes go through a temp file plus rename so a crash mid-write never
/// leaves a truncated state file. Loads are lenient: a missing or
/// unreadable file yields a fresh run rather than an error, so a damaged
/// state file costs a re-run, not a stuck one.
#[derive(Debug)]
pub struct RunStore {
    /// Path to run.json (empty for in-memory stores).
    run_file: PathBuf,
}

impl RunStore {
    /// Create a store persisting under the given run directory.
    pub fn new(run_dir: &Path) -> Self {
        Self {
            run_file: run_dir.join("run.json"),
        }
    }

    /// Create a store without persistence (for testing).
    pub fn in_memory() -> Self {
        Self {
            run_file: PathBuf::new(),
        }
    }

    /// Path to the state file.
    pub fn path(&self) -> &Path {
        &self.run_file
    }

    /// Whether a persisted state file exists.
    pub fn exists(&self) -> bool {
        !self.run_file.as_os_str().is_empty() && self.run_file.exists()
    }

    /// Load the persisted run.
    ///
    /// Returns an error when the file is missing or unparsable; use
    /// `load_or_new` for the lenient path.
    pub fn load(&self) -> Result<PipelineRun, std::io::Error> {
        let content = fs::read_to_string(&self.run_file)?;
        let envelope: RunEnvelope = serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(envelope.run)
    }

    /// Load the persisted run, or start fresh when none is usable.
    pub fn load_or_new(&self, run_id: &str) -> PipelineRun {
        if !self.exists() {
            return PipelineRun::new(run_id);
        }

        match self.load() {
            Ok(run) => {
                tracing::debug!("Loaded persisted state for run '{}'", run.run_id);
                run
            }
            Err(e) => {
                tracing::warn!("Failed to load run.json: {}; starting fresh", e);
                PipelineRun::new(run_id)
            }
        }
    }

    /// Persist the run to disk.
    pub fn save(&self, run: &PipelineRun) -> Result<(), std::io::Error> {
        if self.run_file.as_os_str().is_empty() {
            return Ok(()); // In-memory store, nothing to save
        }

        if let Some(parent) = self.run_file.parent() {
            fs::create_dir_all(parent)?;
        }

        let envelope = RunEnvelope {
            version: RUN_STATE_VERSION,
            run: run.clone(),
        };

        let json = serde_json::to_string_pretty(&envelope)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        // Temp file plus rename keeps run.json whole across a crash
        let temp_file = self.run_file.with_extension("json.tmp");
        fs::write(&temp_file, &json)?;
        fs::rename(&temp_file, &self.run_file)?;

        tracing::debug!("Persisted run state to {}", self.run_file.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Stage, StageStatus};
    use tempfile::tempdir;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = RunStore::new(dir.path());

        let mut run = PipelineRun::new("run_1");
        run.set_status(Stage::Script, StageStatus::Done);
        run.record_asset("script", dir.path().join("script.txt"));
        store.save(&run).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, run);
        assert_eq!(loaded.status(Stage::Script), StageStatus::Done);
    }

    #[test]
    fn load_or_new_starts_fresh_when_missing() {
        let dir = tempdir().unwrap();
        let store = RunStore::new(dir.path());

        let run = store.load_or_new("run_9");
        assert_eq!(run.run_id, "run_9");
        assert_eq!(run.status(Stage::Script), StageStatus::Pending);
    }

    #[test]
    fn load_or_new_survives_corrupt_state() {
        let dir = tempdir().unwrap();
        let store = RunStore::new(dir.path());
        fs::write(store.path(), "{ not json").unwrap();

        let run = store.load_or_new("run_2");
        assert_eq!(run.run_id, "run_2");
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = RunStore::new(dir.path());
        store.save(&PipelineRun::new("run_3")).unwrap();

        assert!(store.path().exists());
        assert!(!dir.path().join("run.json.tmp").exists());
    }

    #[test]
    fn in_memory_store_saves_nothing() {
        let store = RunStore::in_memory();
        store.save(&PipelineRun::new("run_4")).unwrap();
        assert!(!store.exists());
    }

    #[test]
    fn envelope_records_version() {
        let dir = tempdir().unwrap();
        let store = RunStore::new(dir.path());
        store.save(&PipelineRun::new("run_5")).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("\"version\": 1"));
    }
}

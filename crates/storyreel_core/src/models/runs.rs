//! Persisted run state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::enums::{Stage, StageStatus};

/// The durable record of one pipeline run.
///
/// Updated and persisted after every stage transition, so a crashed or
/// cancelled run can resume without repeating completed work. Maps are
/// ordered so the serialized form is stable across saves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Unique run identifier (also the run directory name).
    pub run_id: String,
    /// When the run was created (RFC 3339).
    pub created_at: String,
    /// Status of every stage.
    #[serde(default)]
    pub stage_statuses: BTreeMap<Stage, StageStatus>,
    /// Artifact key -> produced file path.
    #[serde(default)]
    pub asset_paths: BTreeMap<String, PathBuf>,
    /// Cause of the most recent stage failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl PipelineRun {
    /// Create a fresh run with every stage pending.
    pub fn new(run_id: impl Into<String>) -> Self {
        let mut stage_statuses = BTreeMap::new();
        for stage in Stage::all() {
            stage_statuses.insert(*stage, StageStatus::Pending);
        }
        Self {
            run_id: run_id.into(),
            created_at: chrono::Local::now().to_rfc3339(),
            stage_statuses,
            asset_paths: BTreeMap::new(),
            last_error: None,
        }
    }

    /// Status of a stage (Pending when never recorded).
    pub fn status(&self, stage: Stage) -> StageStatus {
        self.stage_statuses
            .get(&stage)
            .copied()
            .unwrap_or_default()
    }

    /// Record a stage status.
    pub fn set_status(&mut self, stage: Stage, status: StageStatus) {
        self.stage_statuses.insert(stage, status);
    }

    /// Record a stage failure and its cause.
    pub fn mark_failed(&mut self, stage: Stage, error: impl Into<String>) {
        self.set_status(stage, StageStatus::Failed);
        self.last_error = Some(error.into());
    }

    /// Whether a stage has completed.
    pub fn is_done(&self, stage: Stage) -> bool {
        self.status(stage) == StageStatus::Done
    }

    /// Record an artifact path under its key.
    pub fn record_asset(&mut self, key: impl Into<String>, path: impl Into<PathBuf>) {
        self.asset_paths.insert(key.into(), path.into());
    }

    /// Look up an artifact path.
    pub fn asset(&self, key: &str) -> Option<&Path> {
        self.asset_paths.get(key).map(|p| p.as_path())
    }

    /// Whether every stage has completed.
    pub fn all_done(&self) -> bool {
        Stage::all().iter().all(|s| self.is_done(*s))
    }

    /// First stage that is not Done, in execution order.
    pub fn next_stage(&self) -> Option<Stage> {
        Stage::all().iter().copied().find(|s| !self.is_done(*s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_run_is_all_pending() {
        let run = PipelineRun::new("run-1");
        assert_eq!(run.stage_statuses.len(), Stage::all().len());
        for stage in Stage::all() {
            assert_eq!(run.status(*stage), StageStatus::Pending);
        }
        assert!(!run.all_done());
        assert_eq!(run.next_stage(), Some(Stage::Script));
    }

    #[test]
    fn mark_failed_records_cause() {
        let mut run = PipelineRun::new("run-1");
        run.mark_failed(Stage::Audio, "synth exploded");
        assert_eq!(run.status(Stage::Audio), StageStatus::Failed);
        assert_eq!(run.last_error.as_deref(), Some("synth exploded"));
    }

    #[test]
    fn run_round_trips_through_json() {
        let mut run = PipelineRun::new("run-42");
        run.set_status(Stage::Script, StageStatus::Done);
        run.record_asset("script", "/runs/run-42/script.txt");

        let json = serde_json::to_string(&run).unwrap();
        assert!(json.contains("\"script\":\"done\""));

        let back: PipelineRun = serde_json::from_str(&json).unwrap();
        assert_eq!(back, run);
        assert_eq!(
            back.asset("script"),
            Some(Path::new("/runs/run-42/script.txt"))
        );
    }
}

//! Audio stage - synthesizes narration through the speech collaborator.

use std::fs;

use crate::captions::strip_heading_markers;
use crate::models::{NarrationAudio, PipelineRun, Stage};
use crate::orchestrator::errors::{StageError, StageResult};
use crate::orchestrator::stage::PipelineStage;
use crate::orchestrator::types::{Context, RunState, StageOutcome};

/// Audio stage.
///
/// Hands the spoken script (heading markers stripped) to the speech
/// collaborator and records the produced narration next to a JSON
/// sidecar carrying path and measured duration, so resumed runs learn
/// the duration without re-probing the audio.
pub struct AudioStage;

impl AudioStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AudioStage {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStage for AudioStage {
    fn stage(&self) -> Stage {
        Stage::Audio
    }

    fn description(&self) -> &str {
        "Synthesize the narration audio"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StageResult<()> {
        if !state.has_script() {
            return Err(StageError::invalid_input("No script to narrate"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StageResult<StageOutcome> {
        let script = state
            .script
            .as_ref()
            .ok_or_else(|| StageError::invalid_input("No script to narrate"))?;

        // The voice reads body text only; heading markers are layout hints
        let spoken = strip_heading_markers(script);

        ctx.logger.info("Synthesizing narration");
        let narration_path = ctx.artifact_path("narration");
        let narration = ctx.services.speech.synthesize(&spoken, &narration_path)?;

        let meta = serde_json::to_string_pretty(&narration)
            .map_err(|e| StageError::parse_error("narration metadata", e.to_string()))?;
        fs::write(ctx.artifact_path("narration_meta"), meta)
            .map_err(|e| StageError::io_error("writing narration.json", e))?;

        ctx.logger.success(&format!(
            "Narration ready: {} ({} ms)",
            narration.path.display(),
            narration.duration_ms
        ));

        state.narration = Some(narration);
        Ok(StageOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StageResult<()> {
        let narration = state
            .narration
            .as_ref()
            .ok_or_else(|| StageError::invalid_output("Narration not recorded"))?;
        if !narration.path.exists() {
            return Err(StageError::invalid_output(format!(
                "Narration file not created: {}",
                narration.path.display()
            )));
        }
        if narration.duration_ms == 0 {
            return Err(StageError::invalid_output("Narration reports zero duration"));
        }
        Ok(())
    }

    fn artifact_keys(&self) -> &'static [&'static str] {
        &["narration", "narration_meta"]
    }

    fn load_output(
        &self,
        _ctx: &Context,
        run: &PipelineRun,
        state: &mut RunState,
    ) -> StageResult<()> {
        let meta_path = run
            .asset("narration_meta")
            .ok_or_else(|| StageError::file_not_found("narration.json"))?;
        let meta = fs::read_to_string(meta_path)
            .map_err(|e| StageError::io_error("reading narration.json", e))?;
        let narration: NarrationAudio = serde_json::from_str(&meta)
            .map_err(|e| StageError::parse_error("narration.json", e.to_string()))?;
        state.narration = Some(narration);
        Ok(())
    }
}

//! Prompts stage - builds one image prompt per pacing chunk.

use std::fs;

use crate::models::{PipelineRun, ScenePrompt, Stage};
use crate::orchestrator::errors::{StageError, StageResult};
use crate::orchestrator::stage::PipelineStage;
use crate::orchestrator::types::{Context, RunState, StageOutcome};

/// Prompts stage.
///
/// Asks the prompt collaborator for one scene prompt per pacing chunk,
/// in chunk order. Prompt content is the collaborator's business; this
/// stage only guarantees the one-to-one pairing with chunks.
pub struct PromptsStage;

impl PromptsStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PromptsStage {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStage for PromptsStage {
    fn stage(&self) -> Stage {
        Stage::Prompts
    }

    fn description(&self) -> &str {
        "Build scene prompts from pacing chunks"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StageResult<()> {
        if !state.has_chunks() {
            return Err(StageError::invalid_input("No pacing chunks to prompt from"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StageResult<StageOutcome> {
        let chunks = state
            .chunks
            .as_ref()
            .ok_or_else(|| StageError::invalid_input("No pacing chunks to prompt from"))?;

        let mut prompts = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            let prompt = ctx.services.prompts.scene_prompt(chunk, &ctx.brief)?;
            prompts.push(ScenePrompt { index, prompt });
        }

        let prompts_json = serde_json::to_string_pretty(&prompts)
            .map_err(|e| StageError::parse_error("scene prompts", e.to_string()))?;
        fs::write(ctx.artifact_path("prompts"), prompts_json)
            .map_err(|e| StageError::io_error("writing prompts.json", e))?;

        ctx.logger
            .success(&format!("{} scene prompts ready", prompts.len()));

        state.prompts = Some(prompts);
        Ok(StageOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StageResult<()> {
        let prompts = state
            .prompts
            .as_ref()
            .ok_or_else(|| StageError::invalid_output("Scene prompts not recorded"))?;
        let chunks = state
            .chunks
            .as_ref()
            .ok_or_else(|| StageError::invalid_output("Pacing chunks missing"))?;
        if prompts.len() != chunks.len() {
            return Err(StageError::invalid_output(format!(
                "Prompt count {} does not match chunk count {}",
                prompts.len(),
                chunks.len()
            )));
        }
        Ok(())
    }

    fn artifact_keys(&self) -> &'static [&'static str] {
        &["prompts"]
    }

    fn load_output(
        &self,
        _ctx: &Context,
        run: &PipelineRun,
        state: &mut RunState,
    ) -> StageResult<()> {
        let path = run
            .asset("prompts")
            .ok_or_else(|| StageError::file_not_found("prompts.json"))?;
        let json = fs::read_to_string(path)
            .map_err(|e| StageError::io_error("reading prompts.json", e))?;
        let prompts: Vec<ScenePrompt> = serde_json::from_str(&json)
            .map_err(|e| StageError::parse_error("prompts.json", e.to_string()))?;
        state.prompts = Some(prompts);
        Ok(())
    }
}

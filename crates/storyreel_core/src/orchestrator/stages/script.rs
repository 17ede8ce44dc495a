//! Script stage - obtains the narration script from the script collaborator.

use std::fs;

use crate::models::{PipelineRun, Stage};
use crate::orchestrator::errors::{StageError, StageResult};
use crate::orchestrator::stage::PipelineStage;
use crate::orchestrator::types::{Context, RunState, StageOutcome};

/// Script stage.
///
/// Delegates to the script collaborator and persists the raw script,
/// heading markers included, as `script.txt`. Downstream stages strip
/// the markers where spoken text is needed.
pub struct ScriptStage;

impl ScriptStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ScriptStage {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStage for ScriptStage {
    fn stage(&self) -> Stage {
        Stage::Script
    }

    fn description(&self) -> &str {
        "Generate the narration script"
    }

    fn validate_input(&self, ctx: &Context, _state: &RunState) -> StageResult<()> {
        // A script comes from topics (generated) or from a source file hint
        if ctx.brief.topics.is_empty() && ctx.brief.source("script").is_none() {
            return Err(StageError::invalid_input(
                "Brief has no topics and no script source",
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StageResult<StageOutcome> {
        ctx.logger.info("Requesting narration script");

        let script = ctx.services.script.generate(&ctx.brief)?;

        let script_path = ctx.artifact_path("script");
        fs::write(&script_path, &script)
            .map_err(|e| StageError::io_error("writing script.txt", e))?;

        ctx.logger.success(&format!(
            "Script ready ({} words)",
            script.split_whitespace().count()
        ));

        state.script = Some(script);
        Ok(StageOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StageResult<()> {
        let script = state
            .script
            .as_ref()
            .ok_or_else(|| StageError::invalid_output("Script not recorded"))?;
        if script.trim().is_empty() {
            return Err(StageError::invalid_output("Script is empty"));
        }
        Ok(())
    }

    fn artifact_keys(&self) -> &'static [&'static str] {
        &["script"]
    }

    fn load_output(
        &self,
        _ctx: &Context,
        run: &PipelineRun,
        state: &mut RunState,
    ) -> StageResult<()> {
        let path = run
            .asset("script")
            .ok_or_else(|| StageError::file_not_found("script.txt"))?;
        let script = fs::read_to_string(path)
            .map_err(|e| StageError::io_error("reading script.txt", e))?;
        state.script = Some(script);
        Ok(())
    }
}

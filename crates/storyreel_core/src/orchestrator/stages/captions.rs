//! Captions stage - lays out word timestamps and writes the subtitle file.

use std::fs;

use crate::captions::{extract_headings, write_ass, CaptionLayout};
use crate::models::{PipelineRun, Stage, StyleTag};
use crate::orchestrator::errors::{StageError, StageResult};
use crate::orchestrator::stage::PipelineStage;
use crate::orchestrator::types::{Context, RunState, StageOutcome};

/// Captions stage.
///
/// Extracts heading strings from the raw script, lays the transcribed
/// words out into Body/Heading lines, and writes `captions.ass` for the
/// render stage to burn in.
pub struct CaptionsStage;

impl CaptionsStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CaptionsStage {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStage for CaptionsStage {
    fn stage(&self) -> Stage {
        Stage::Captions
    }

    fn description(&self) -> &str {
        "Lay out captions and write the subtitle file"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StageResult<()> {
        if !state.has_script() {
            return Err(StageError::invalid_input("No script for heading extraction"));
        }
        if !state.has_words() {
            return Err(StageError::invalid_input("No word timestamps to lay out"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StageResult<StageOutcome> {
        let script = state
            .script
            .as_ref()
            .ok_or_else(|| StageError::invalid_input("No script for heading extraction"))?;
        let words = state
            .words
            .as_ref()
            .ok_or_else(|| StageError::invalid_input("No word timestamps to lay out"))?;

        let headings = extract_headings(script);
        ctx.logger
            .info(&format!("{} headings declared in script", headings.len()));

        let layout = CaptionLayout::new(ctx.settings.captions.layout_config());
        let lines = layout.layout(words, &headings)?;

        let heading_lines = lines
            .iter()
            .filter(|l| l.style_tag == StyleTag::Heading)
            .count();

        let content = write_ass(&lines, &ctx.settings.captions.ass_styles());
        let captions_path = ctx.artifact_path("captions");
        fs::write(&captions_path, content)
            .map_err(|e| StageError::io_error("writing captions.ass", e))?;

        ctx.logger.success(&format!(
            "{} caption lines ({} headings) -> {}",
            lines.len(),
            heading_lines,
            captions_path.display()
        ));

        state.captions_path = Some(captions_path);
        Ok(StageOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StageResult<()> {
        let path = state
            .captions_path
            .as_ref()
            .ok_or_else(|| StageError::invalid_output("Caption file not recorded"))?;
        if !path.exists() {
            return Err(StageError::invalid_output(format!(
                "Caption file not created: {}",
                path.display()
            )));
        }
        Ok(())
    }

    fn artifact_keys(&self) -> &'static [&'static str] {
        &["captions"]
    }

    fn load_output(
        &self,
        _ctx: &Context,
        run: &PipelineRun,
        state: &mut RunState,
    ) -> StageResult<()> {
        let path = run
            .asset("captions")
            .ok_or_else(|| StageError::file_not_found("captions.ass"))?;
        state.captions_path = Some(path.to_path_buf());
        Ok(())
    }
}

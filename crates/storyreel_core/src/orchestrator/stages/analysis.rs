//! Analysis stage - transcribes narration and builds pacing chunks.

use std::fs;

use crate::models::{PacingChunk, PipelineRun, Stage, TrailingSilence, WordTimestamp};
use crate::orchestrator::errors::{StageError, StageResult};
use crate::orchestrator::stage::PipelineStage;
use crate::orchestrator::types::{Context, RunState, StageOutcome};
use crate::timing::{build_pacing_chunks, verify_tiling};

/// Analysis stage.
///
/// Obtains word-level timestamps from the transcription collaborator,
/// then derives the pacing chunks that drive scene changes. Words and
/// chunks are persisted as JSON so resumed runs skip transcription.
pub struct AnalysisStage;

impl AnalysisStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AnalysisStage {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStage for AnalysisStage {
    fn stage(&self) -> Stage {
        Stage::Analysis
    }

    fn description(&self) -> &str {
        "Transcribe narration and derive pacing"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StageResult<()> {
        if !state.has_narration() {
            return Err(StageError::invalid_input("No narration to analyze"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StageResult<StageOutcome> {
        let narration = state
            .narration
            .as_ref()
            .ok_or_else(|| StageError::invalid_input("No narration to analyze"))?;

        ctx.logger.info("Transcribing narration");
        let words = ctx.services.transcription.transcribe(narration)?;
        ctx.logger
            .info(&format!("{} words with timestamps", words.len()));

        let words_json = serde_json::to_string_pretty(&words)
            .map_err(|e| StageError::parse_error("word timestamps", e.to_string()))?;
        fs::write(ctx.artifact_path("words"), words_json)
            .map_err(|e| StageError::io_error("writing words.json", e))?;

        let config = ctx.settings.timing.timing_config();
        let chunks = build_pacing_chunks(&words, narration.duration_ms, &config)?;

        let chunks_json = serde_json::to_string_pretty(&chunks)
            .map_err(|e| StageError::parse_error("pacing chunks", e.to_string()))?;
        fs::write(ctx.artifact_path("chunks"), chunks_json)
            .map_err(|e| StageError::io_error("writing chunks.json", e))?;

        ctx.logger.success(&format!(
            "{} pacing chunks over {} ms",
            chunks.len(),
            narration.duration_ms
        ));

        state.words = Some(words);
        state.chunks = Some(chunks);
        Ok(StageOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &RunState) -> StageResult<()> {
        let narration = state
            .narration
            .as_ref()
            .ok_or_else(|| StageError::invalid_output("Narration not recorded"))?;
        if !state.has_words() {
            return Err(StageError::invalid_output("Word timestamps not recorded"));
        }
        let chunks = state
            .chunks
            .as_ref()
            .ok_or_else(|| StageError::invalid_output("Pacing chunks not recorded"))?;
        if chunks.is_empty() {
            return Err(StageError::invalid_output(
                "Transcription yielded no pacing chunks",
            ));
        }

        // The tiled interval ends where the trailing-silence policy says
        let timeline_end = match ctx.settings.timing.trailing_silence {
            TrailingSilence::ExtendLast => narration.duration_ms,
            TrailingSilence::Discard => chunks.last().map(|c| c.end_ms()).unwrap_or(0),
        };
        verify_tiling(chunks, timeline_end)?;
        ctx.logger.validation(&format!(
            "{} chunks tile 0..{} ms with no gaps",
            chunks.len(),
            timeline_end
        ));
        Ok(())
    }

    fn artifact_keys(&self) -> &'static [&'static str] {
        &["words", "chunks"]
    }

    fn load_output(
        &self,
        _ctx: &Context,
        run: &PipelineRun,
        state: &mut RunState,
    ) -> StageResult<()> {
        let words_path = run
            .asset("words")
            .ok_or_else(|| StageError::file_not_found("words.json"))?;
        let words_json = fs::read_to_string(words_path)
            .map_err(|e| StageError::io_error("reading words.json", e))?;
        let words: Vec<WordTimestamp> = serde_json::from_str(&words_json)
            .map_err(|e| StageError::parse_error("words.json", e.to_string()))?;

        let chunks_path = run
            .asset("chunks")
            .ok_or_else(|| StageError::file_not_found("chunks.json"))?;
        let chunks_json = fs::read_to_string(chunks_path)
            .map_err(|e| StageError::io_error("reading chunks.json", e))?;
        let chunks: Vec<PacingChunk> = serde_json::from_str(&chunks_json)
            .map_err(|e| StageError::parse_error("chunks.json", e.to_string()))?;

        state.words = Some(words);
        state.chunks = Some(chunks);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Brief, NarrationAudio};
    use crate::orchestrator::types::test_support::{canned_services, test_context};
    use tempfile::tempdir;

    fn narrated_state(ctx: &Context, duration_ms: u64) -> RunState {
        let mut state = RunState::default();
        state.narration = Some(NarrationAudio {
            path: ctx.artifact_path("narration"),
            duration_ms,
        });
        state
    }

    #[test]
    fn builds_chunks_from_transcribed_words() {
        let dir = tempdir().unwrap();
        let words = vec![
            WordTimestamp::new("Hello", 0, 400),
            WordTimestamp::new("world", 500, 900),
            WordTimestamp::new("Next", 2000, 2300),
        ];
        let services = canned_services("unused", 2300, &words);
        let mut ctx = test_context(dir.path().to_path_buf(), Brief::default(), services);
        // Keep the short trailing chunk from merging backward
        ctx.settings.timing.min_chunk_ms = 100;

        let mut state = narrated_state(&ctx, 2300);
        AnalysisStage::new().execute(&ctx, &mut state).unwrap();

        let chunks = state.chunks.as_ref().unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].raw_text, "Hello world");
        assert_eq!(chunks[1].raw_text, "Next");
        assert!(ctx.artifact_path("words").exists());
        assert!(ctx.artifact_path("chunks").exists());

        AnalysisStage::new().validate_output(&ctx, &state).unwrap();
    }

    #[test]
    fn empty_transcription_fails_output_validation() {
        let dir = tempdir().unwrap();
        let services = canned_services("unused", 2000, &[]);
        let ctx = test_context(dir.path().to_path_buf(), Brief::default(), services);

        let mut state = narrated_state(&ctx, 2000);
        AnalysisStage::new().execute(&ctx, &mut state).unwrap();

        let err = AnalysisStage::new()
            .validate_output(&ctx, &state)
            .unwrap_err();
        assert!(err.to_string().contains("no pacing chunks"));
    }

    #[test]
    fn load_output_restores_words_and_chunks() {
        let dir = tempdir().unwrap();
        let words = vec![WordTimestamp::new("Hi", 0, 300)];
        let services = canned_services("unused", 1200, &words);
        let ctx = test_context(dir.path().to_path_buf(), Brief::default(), services);

        let mut state = narrated_state(&ctx, 1200);
        AnalysisStage::new().execute(&ctx, &mut state).unwrap();

        let mut run = PipelineRun::new("run_test");
        run.record_asset("words", ctx.artifact_path("words"));
        run.record_asset("chunks", ctx.artifact_path("chunks"));

        let mut resumed = RunState::default();
        AnalysisStage::new()
            .load_output(&ctx, &run, &mut resumed)
            .unwrap();
        assert_eq!(resumed.words, state.words);
        assert_eq!(resumed.chunks, state.chunks);
    }
}

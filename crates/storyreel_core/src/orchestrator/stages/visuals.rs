//! Visuals stage - generates one image per scene and assigns durations.

use std::fs;

use crate::models::{PipelineRun, Stage, VisualAsset};
use crate::orchestrator::errors::{StageError, StageResult};
use crate::orchestrator::stage::PipelineStage;
use crate::orchestrator::types::{Context, RunState, StageOutcome};

/// Visuals stage.
///
/// Generates one still per scene prompt and pairs it with the scene's
/// on-screen duration. Every scene except the last gets `crossfade_ms`
/// added, so after crossfade overlap the assembled video length equals
/// the narration length.
pub struct VisualsStage;

impl VisualsStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VisualsStage {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStage for VisualsStage {
    fn stage(&self) -> Stage {
        Stage::Visuals
    }

    fn description(&self) -> &str {
        "Generate scene visuals"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StageResult<()> {
        let prompts = state
            .prompts
            .as_ref()
            .ok_or_else(|| StageError::invalid_input("No scene prompts"))?;
        let chunks = state
            .chunks
            .as_ref()
            .ok_or_else(|| StageError::invalid_input("No pacing chunks"))?;
        if prompts.len() != chunks.len() {
            return Err(StageError::invalid_input(format!(
                "Prompt count {} does not match chunk count {}",
                prompts.len(),
                chunks.len()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StageResult<StageOutcome> {
        let prompts = state
            .prompts
            .as_ref()
            .ok_or_else(|| StageError::invalid_input("No scene prompts"))?;
        let chunks = state
            .chunks
            .as_ref()
            .ok_or_else(|| StageError::invalid_input("No pacing chunks"))?;

        let images_dir = ctx.images_dir();
        let crossfade_ms = ctx.settings.render.crossfade_ms;
        let total = prompts.len();

        let mut scenes = Vec::with_capacity(total);
        for (i, prompt) in prompts.iter().enumerate() {
            let path = ctx
                .services
                .visuals
                .generate(&prompt.prompt, prompt.index, &images_dir)?;
            ctx.logger.info(&format!(
                "Scene {}/{}: {}",
                i + 1,
                total,
                path.file_name().unwrap_or_default().to_string_lossy()
            ));

            // Pad every scene but the last by the crossfade overlap
            let pad_ms = if i + 1 == total { 0 } else { crossfade_ms };
            let duration_s = (chunks[i].duration_ms + pad_ms) as f64 / 1000.0;
            scenes.push(VisualAsset::new(path, duration_s));
        }

        let scenes_json = serde_json::to_string_pretty(&scenes)
            .map_err(|e| StageError::parse_error("visual assets", e.to_string()))?;
        fs::write(ctx.artifact_path("scenes"), scenes_json)
            .map_err(|e| StageError::io_error("writing scenes.json", e))?;

        ctx.logger
            .success(&format!("{} scene visuals ready", scenes.len()));

        state.scenes = Some(scenes);
        Ok(StageOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StageResult<()> {
        let scenes = state
            .scenes
            .as_ref()
            .ok_or_else(|| StageError::invalid_output("Visual assets not recorded"))?;
        for scene in scenes {
            if !scene.path.exists() {
                return Err(StageError::invalid_output(format!(
                    "Scene image not created: {}",
                    scene.path.display()
                )));
            }
            if scene.duration_s <= 0.0 {
                return Err(StageError::invalid_output(format!(
                    "Scene {} has non-positive duration",
                    scene.path.display()
                )));
            }
        }
        Ok(())
    }

    fn artifact_keys(&self) -> &'static [&'static str] {
        &["scenes"]
    }

    fn load_output(
        &self,
        _ctx: &Context,
        run: &PipelineRun,
        state: &mut RunState,
    ) -> StageResult<()> {
        let path = run
            .asset("scenes")
            .ok_or_else(|| StageError::file_not_found("scenes.json"))?;
        let json = fs::read_to_string(path)
            .map_err(|e| StageError::io_error("reading scenes.json", e))?;
        let scenes: Vec<VisualAsset> = serde_json::from_str(&json)
            .map_err(|e| StageError::parse_error("scenes.json", e.to_string()))?;
        state.scenes = Some(scenes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Brief, PacingChunk, ScenePrompt};
    use crate::orchestrator::types::test_support::{canned_services, test_context};
    use tempfile::tempdir;

    fn prompted_state() -> RunState {
        let mut state = RunState::default();
        state.chunks = Some(vec![
            PacingChunk {
                raw_text: "one".to_string(),
                start_ms: 0,
                duration_ms: 3000,
            },
            PacingChunk {
                raw_text: "two".to_string(),
                start_ms: 3000,
                duration_ms: 2500,
            },
        ]);
        state.prompts = Some(vec![
            ScenePrompt {
                index: 0,
                prompt: "one".to_string(),
            },
            ScenePrompt {
                index: 1,
                prompt: "two".to_string(),
            },
        ]);
        state
    }

    #[test]
    fn pads_all_but_last_scene_with_crossfade() {
        let dir = tempdir().unwrap();
        let services = canned_services("unused", 5500, &[]);
        let ctx = test_context(dir.path().to_path_buf(), Brief::default(), services);

        let mut state = prompted_state();
        VisualsStage::new().execute(&ctx, &mut state).unwrap();

        // Default crossfade is 1000 ms: 3000+1000 and 2500+0
        let scenes = state.scenes.as_ref().unwrap();
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].duration_s, 4.0);
        assert_eq!(scenes[1].duration_s, 2.5);
        assert!(scenes[0].path.exists());
        assert!(scenes[1].path.exists());

        VisualsStage::new().validate_output(&ctx, &state).unwrap();
    }

    #[test]
    fn single_scene_gets_no_padding() {
        let dir = tempdir().unwrap();
        let services = canned_services("unused", 4000, &[]);
        let ctx = test_context(dir.path().to_path_buf(), Brief::default(), services);

        let mut state = RunState::default();
        state.chunks = Some(vec![PacingChunk {
            raw_text: "only".to_string(),
            start_ms: 0,
            duration_ms: 4000,
        }]);
        state.prompts = Some(vec![ScenePrompt {
            index: 0,
            prompt: "only".to_string(),
        }]);

        VisualsStage::new().execute(&ctx, &mut state).unwrap();
        assert_eq!(state.scenes.as_ref().unwrap()[0].duration_s, 4.0);
    }

    #[test]
    fn mismatched_prompt_and_chunk_counts_are_rejected() {
        let dir = tempdir().unwrap();
        let services = canned_services("unused", 4000, &[]);
        let ctx = test_context(dir.path().to_path_buf(), Brief::default(), services);

        let mut state = prompted_state();
        state.prompts.as_mut().unwrap().pop();

        let err = VisualsStage::new()
            .validate_input(&ctx, &state)
            .unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn load_output_restores_scene_list() {
        let dir = tempdir().unwrap();
        let services = canned_services("unused", 5500, &[]);
        let ctx = test_context(dir.path().to_path_buf(), Brief::default(), services);

        let mut state = prompted_state();
        VisualsStage::new().execute(&ctx, &mut state).unwrap();

        let mut run = PipelineRun::new("run_test");
        run.record_asset("scenes", ctx.artifact_path("scenes"));

        let mut resumed = RunState::default();
        VisualsStage::new()
            .load_output(&ctx, &run, &mut resumed)
            .unwrap();
        assert_eq!(resumed.scenes, state.scenes);
    }
}

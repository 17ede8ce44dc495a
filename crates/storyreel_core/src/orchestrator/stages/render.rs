//! Render stage - builds the render graph, compiles it, and hands it to ffmpeg.

use crate::models::{PipelineRun, Stage};
use crate::orchestrator::errors::{StageError, StageResult};
use crate::orchestrator::stage::PipelineStage;
use crate::orchestrator::types::{Context, RunState, StageOutcome};
use crate::render::{compile, RenderGraphBuilder};

/// Render stage.
///
/// Builds the declarative render graph from the accumulated scenes,
/// narration, music, and caption file, compiles it into the two-pass
/// ffmpeg plan, and hands the plan to the render collaborator. The
/// duration agreement check lives in the graph builder.
pub struct RenderStage;

impl RenderStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RenderStage {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStage for RenderStage {
    fn stage(&self) -> Stage {
        Stage::Render
    }

    fn description(&self) -> &str {
        "Assemble and render the final video"
    }

    fn validate_input(&self, ctx: &Context, state: &RunState) -> StageResult<()> {
        if !state.has_scenes() {
            return Err(StageError::invalid_input("No scene visuals to assemble"));
        }
        if !state.has_narration() {
            return Err(StageError::invalid_input("No narration audio"));
        }
        if !state.has_captions() {
            return Err(StageError::invalid_input("No caption file"));
        }
        if let Some(music) = &ctx.brief.music {
            if !music.path.exists() {
                return Err(StageError::file_not_found(music.path.display().to_string()));
            }
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StageResult<StageOutcome> {
        let scenes = state
            .scenes
            .as_ref()
            .ok_or_else(|| StageError::invalid_input("No scene visuals to assemble"))?;
        let narration = state
            .narration
            .as_ref()
            .ok_or_else(|| StageError::invalid_input("No narration audio"))?;
        let captions_path = state
            .captions_path
            .as_ref()
            .ok_or_else(|| StageError::invalid_input("No caption file"))?;

        let output_path = ctx.artifact_path("video");

        ctx.logger.info("Building render graph");
        let builder = RenderGraphBuilder::new(ctx.settings.render.render_config());
        let graph = builder.build(
            scenes,
            narration,
            ctx.brief.music.as_ref(),
            captions_path,
            &output_path,
        )?;

        let assembled = ctx.temp_dir().join("assembled.mp4");
        let plan = compile(&graph, &assembled);

        ctx.logger
            .command(&format!("ffmpeg {}", plan.assemble.args.join(" ")));
        ctx.logger
            .command(&format!("ffmpeg {}", plan.burn.args.join(" ")));
        if ctx.settings.logging.show_render_args_pretty {
            ctx.logger.log_render_args_pretty("assemble", &plan.assemble.args);
            ctx.logger.log_render_args_pretty("burn", &plan.burn.args);
        }
        if ctx.settings.logging.show_render_args_json {
            ctx.logger.log_render_args_json("assemble", &plan.assemble.args);
            ctx.logger.log_render_args_json("burn", &plan.burn.args);
        }

        ctx.logger.section("Executing render");
        let video_path = ctx.services.render.execute(&plan)?;

        ctx.logger.success(&format!(
            "Rendered: {}",
            video_path.file_name().unwrap_or_default().to_string_lossy()
        ));

        state.video_path = Some(video_path);
        Ok(StageOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StageResult<()> {
        let video = state
            .video_path
            .as_ref()
            .ok_or_else(|| StageError::invalid_output("Video path not recorded"))?;
        if !video.exists() {
            return Err(StageError::invalid_output(format!(
                "Video not created: {}",
                video.display()
            )));
        }
        Ok(())
    }

    fn artifact_keys(&self) -> &'static [&'static str] {
        &["video"]
    }

    fn load_output(
        &self,
        _ctx: &Context,
        run: &PipelineRun,
        state: &mut RunState,
    ) -> StageResult<()> {
        let path = run
            .asset("video")
            .ok_or_else(|| StageError::file_not_found("final video"))?;
        state.video_path = Some(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Brief, MusicTrack, NarrationAudio, VisualAsset};
    use crate::orchestrator::types::test_support::{canned_services, test_context};
    use crate::render::RenderError;
    use std::fs;
    use tempfile::tempdir;

    fn renderable_state(ctx: &Context, narration_ms: u64) -> RunState {
        let img_a = ctx.images_dir().join("scene_000.png");
        let img_b = ctx.images_dir().join("scene_001.png");
        fs::write(&img_a, b"png").unwrap();
        fs::write(&img_b, b"png").unwrap();

        let captions = ctx.artifact_path("captions");
        fs::write(&captions, "[Script Info]\n").unwrap();

        let mut state = RunState::default();
        // Default crossfade 1000 ms: assembled length 4000+2500-1000 = 5500
        state.scenes = Some(vec![
            VisualAsset::new(img_a, 4.0),
            VisualAsset::new(img_b, 2.5),
        ]);
        state.narration = Some(NarrationAudio {
            path: ctx.artifact_path("narration"),
            duration_ms: narration_ms,
        });
        state.captions_path = Some(captions);
        state
    }

    #[test]
    fn renders_video_through_collaborator() {
        let dir = tempdir().unwrap();
        let services = canned_services("unused", 5500, &[]);
        let ctx = test_context(dir.path().to_path_buf(), Brief::default(), services);

        let mut state = renderable_state(&ctx, 5500);
        RenderStage::new().execute(&ctx, &mut state).unwrap();

        assert_eq!(state.video_path, Some(ctx.artifact_path("video")));
        assert!(ctx.artifact_path("video").exists());

        RenderStage::new().validate_output(&ctx, &state).unwrap();
    }

    #[test]
    fn duration_mismatch_stops_the_render() {
        let dir = tempdir().unwrap();
        let services = canned_services("unused", 9000, &[]);
        let ctx = test_context(dir.path().to_path_buf(), Brief::default(), services);

        let mut state = renderable_state(&ctx, 9000);
        let err = RenderStage::new().execute(&ctx, &mut state).unwrap_err();
        assert!(matches!(
            err,
            StageError::Render(RenderError::DurationMismatch {
                video_ms: 5500,
                narration_ms: 9000,
            })
        ));
    }

    #[test]
    fn missing_music_file_fails_input_validation() {
        let dir = tempdir().unwrap();
        let services = canned_services("unused", 5500, &[]);
        let brief = Brief {
            music: Some(MusicTrack {
                path: dir.path().join("nope.mp3"),
                volume: 0.2,
            }),
            ..Brief::default()
        };
        let ctx = test_context(dir.path().to_path_buf(), brief, services);

        let state = renderable_state(&ctx, 5500);
        let err = RenderStage::new().validate_input(&ctx, &state).unwrap_err();
        assert!(matches!(err, StageError::FileNotFound { .. }));
    }

    #[test]
    fn load_output_restores_video_path() {
        let dir = tempdir().unwrap();
        let services = canned_services("unused", 5500, &[]);
        let ctx = test_context(dir.path().to_path_buf(), Brief::default(), services);

        let mut run = PipelineRun::new("run_test");
        run.record_asset("video", ctx.artifact_path("video"));

        let mut state = RunState::default();
        RenderStage::new()
            .load_output(&ctx, &run, &mut state)
            .unwrap();
        assert_eq!(state.video_path, Some(ctx.artifact_path("video")));
    }
}

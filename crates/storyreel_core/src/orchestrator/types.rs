//! Core types for the pipeline orchestrator.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::logging::RunLogger;
use crate::models::{
    Brief, NarrationAudio, PacingChunk, ScenePrompt, VisualAsset, WordTimestamp,
};
use crate::services::ServiceSet;

/// Observer invoked as stages start and finish.
///
/// Arguments: (stage_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Read-only context passed to pipeline stages.
///
/// Carries the brief, configuration, run directories, and collaborators
/// that stages read but never modify. Mutable results go in [`RunState`].
pub struct Context {
    /// The creative brief that seeds the run.
    pub brief: Brief,
    /// Full application settings, sections picked apart by each stage.
    pub settings: Settings,
    /// Run identifier (also the run directory name).
    pub run_id: String,
    /// Directory owning everything this run produces.
    pub run_dir: PathBuf,
    /// Per-run logger.
    pub logger: Arc<RunLogger>,
    /// Collaborator implementations, one per seam.
    pub services: ServiceSet,
    /// Progress observer, absent unless the embedder installs one.
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    /// Create a new context for a run.
    pub fn new(
        brief: Brief,
        settings: Settings,
        run_id: impl Into<String>,
        run_dir: PathBuf,
        logger: Arc<RunLogger>,
        services: ServiceSet,
    ) -> Self {
        Self {
            brief,
            settings,
            run_id: run_id.into(),
            run_dir,
            logger,
            services,
            progress_callback: None,
        }
    }

    /// Install a progress observer.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to the callback (if set).
    pub fn report_progress(&self, stage_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(stage_name, percent, message);
        }
    }

    /// Directory for generated scene images.
    pub fn images_dir(&self) -> PathBuf {
        self.run_dir.join("images")
    }

    /// Directory for narration audio.
    pub fn audio_dir(&self) -> PathBuf {
        self.run_dir.join("audio")
    }

    /// Directory for intermediate render products.
    pub fn temp_dir(&self) -> PathBuf {
        self.run_dir.join("temp")
    }

    /// Where an artifact key lives inside the run directory.
    ///
    /// Keys and locations are fixed so resumed runs find artifacts where
    /// the original run left them. The final video name comes from the
    /// brief when given, otherwise `<run_id>.mp4`.
    pub fn artifact_path(&self, key: &str) -> PathBuf {
        match key {
            "script" => self.run_dir.join("script.txt"),
            "narration" => self.audio_dir().join("narration.wav"),
            "narration_meta" => self.audio_dir().join("narration.json"),
            "words" => self.run_dir.join("words.json"),
            "chunks" => self.run_dir.join("chunks.json"),
            "prompts" => self.run_dir.join("prompts.json"),
            "scenes" => self.run_dir.join("scenes.json"),
            "captions" => self.run_dir.join("captions.ass"),
            "video" => {
                let name = self
                    .brief
                    .output_filename
                    .clone()
                    .unwrap_or_else(|| format!("{}.mp4", self.run_id));
                self.run_dir.join(name)
            }
            other => self.run_dir.join(other),
        }
    }
}

/// In-memory outputs accumulated while a run executes.
///
/// Each stage fills its own slot; resumed runs hydrate slots from
/// persisted artifacts instead of re-executing. Nothing here is
/// persisted directly - the durable record is `PipelineRun` plus the
/// artifact files themselves.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    /// Narration script, headings markers included.
    pub script: Option<String>,
    /// Synthesized narration (path + measured duration).
    pub narration: Option<NarrationAudio>,
    /// Word-level timestamps from transcription.
    pub words: Option<Vec<WordTimestamp>>,
    /// Pacing chunks tiling the narration.
    pub chunks: Option<Vec<PacingChunk>>,
    /// One prompt per scene.
    pub prompts: Option<Vec<ScenePrompt>>,
    /// Ordered visual assets with display durations.
    pub scenes: Option<Vec<VisualAsset>>,
    /// Written subtitle file.
    pub captions_path: Option<PathBuf>,
    /// Final rendered video.
    pub video_path: Option<PathBuf>,
}

impl RunState {
    pub fn has_script(&self) -> bool {
        self.script.is_some()
    }

    pub fn has_narration(&self) -> bool {
        self.narration.is_some()
    }

    pub fn has_words(&self) -> bool {
        self.words.is_some()
    }

    pub fn has_chunks(&self) -> bool {
        self.chunks.is_some()
    }

    pub fn has_prompts(&self) -> bool {
        self.prompts.is_some()
    }

    pub fn has_scenes(&self) -> bool {
        self.scenes.is_some()
    }

    pub fn has_captions(&self) -> bool {
        self.captions_path.is_some()
    }

    pub fn has_video(&self) -> bool {
        self.video_path.is_some()
    }
}

/// Result of executing a pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Stage completed successfully.
    Success,
    /// Stage was skipped (nothing to do, but not an error).
    Skipped(String),
}


#[cfg(test)]
mod tests {
    use super::test_support::{stub_services, test_context};
    use super::*;

    #[test]
    fn artifact_paths_sit_under_run_dir() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path().to_path_buf(), Brief::default(), stub_services());

        assert_eq!(ctx.artifact_path("script"), dir.path().join("script.txt"));
        assert_eq!(
            ctx.artifact_path("narration"),
            dir.path().join("audio").join("narration.wav")
        );
        assert_eq!(ctx.artifact_path("video"), dir.path().join("run_test.mp4"));
    }

    #[test]
    fn brief_output_filename_overrides_video_name() {
        let dir = tempfile::tempdir().unwrap();
        let brief = Brief {
            output_filename: Some("my_story.mp4".to_string()),
            ..Brief::default()
        };
        let ctx = test_context(dir.path().to_path_buf(), brief, stub_services());

        assert_eq!(ctx.artifact_path("video"), dir.path().join("my_story.mp4"));
    }

    #[test]
    fn run_state_tracks_slots() {
        let mut state = RunState::default();
        assert!(!state.has_script());
        assert!(!state.has_video());

        state.script = Some("Hello world.".to_string());
        assert!(state.has_script());

        state.video_path = Some(PathBuf::from("/runs/run_1/run_1.mp4"));
        assert!(state.has_video());
    }
}

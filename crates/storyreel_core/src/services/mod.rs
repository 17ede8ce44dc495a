//! Collaborator trait seams.
//!
//! Every external capability the pipeline needs (script writing, speech
//! synthesis, transcription, prompt writing, image generation, render
//! execution) sits behind one of these traits. The core stays pure: it
//! decides *what* to ask for and *where* results land, while callers
//! supply implementations that talk to real tools or fixtures.
//!
//! All traits are `Send + Sync` so a [`ServiceSet`] can cross thread
//! boundaries, and all return [`StageResult`] so collaborator failures
//! surface through the normal stage error path. Provider selection
//! (primary/fallback composition) belongs to the caller, never to the
//! core.

use std::path::{Path, PathBuf};

use crate::models::{Brief, NarrationAudio, PacingChunk, WordTimestamp};
use crate::orchestrator::StageResult;
use crate::render::RenderPlan;

/// Produces the narration script for a brief.
///
/// The returned text may carry `:Heading::` markers; the pipeline strips
/// them before speech synthesis and uses them for caption styling.
pub trait ScriptService: Send + Sync {
    fn generate(&self, brief: &Brief) -> StageResult<String>;
}

/// Synthesizes narration audio from a (marker-free) script.
///
/// Implementations write the audio to `out_path` and report the measured
/// duration; the pipeline trusts `duration_ms` for all downstream timing.
pub trait SpeechService: Send + Sync {
    fn synthesize(&self, script: &str, out_path: &Path) -> StageResult<NarrationAudio>;
}

/// Produces word-level timestamps for a narration recording.
///
/// Words must come back in spoken order with non-overlapping spans;
/// pacing analysis rejects disordered input.
pub trait TranscriptionService: Send + Sync {
    fn transcribe(&self, audio: &NarrationAudio) -> StageResult<Vec<WordTimestamp>>;
}

/// Writes one image-generation prompt per pacing chunk.
pub trait PromptService: Send + Sync {
    fn scene_prompt(&self, chunk: &PacingChunk, brief: &Brief) -> StageResult<String>;
}

/// Produces one still image for a scene prompt.
///
/// `index` is the zero-based scene number; implementations place the
/// image under `out_dir` and return its path.
pub trait VisualService: Send + Sync {
    fn generate(&self, prompt: &str, index: usize, out_dir: &Path) -> StageResult<PathBuf>;
}

/// Executes a compiled two-pass render plan and returns the final video.
pub trait RenderService: Send + Sync {
    fn execute(&self, plan: &RenderPlan) -> StageResult<PathBuf>;
}

/// The full set of collaborators a run needs, one per seam.
pub struct ServiceSet {
    pub script: Box<dyn ScriptService>,
    pub speech: Box<dyn SpeechService>,
    pub transcription: Box<dyn TranscriptionService>,
    pub prompts: Box<dyn PromptService>,
    pub visuals: Box<dyn VisualService>,
    pub render: Box<dyn RenderService>,
}

impl std::fmt::Debug for ServiceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSet").finish_non_exhaustive()
    }
}

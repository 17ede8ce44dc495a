//! Pipeline orchestrator for coordinating runs.
//!
//! This module provides the infrastructure for driving one run from
//! brief to final video. A run is a fixed sequence of stages that
//! validate, execute, and record their results; the controller persists
//! run state after every transition so interrupted runs resume without
//! repeating completed work.
//!
//! # Stage sequence
//!
//! ```text
//! StageController
//!     ├── Stage: Script     (narration script)
//!     ├── Stage: Audio      (narration synthesis)
//!     ├── Stage: Analysis   (word timestamps -> pacing chunks)
//!     ├── Stage: Prompts    (one image prompt per chunk)
//!     ├── Stage: Visuals    (scene stills + durations)
//!     ├── Stage: Captions   (subtitle layout + .ass file)
//!     └── Stage: Render     (graph -> ffmpeg plan -> video)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use storyreel_core::orchestrator::{create_standard_controller, Context, RunState, RunStore};
//!
//! let controller = create_standard_controller();
//! let cancel = controller.cancel_handle();
//!
//! let ctx = Context::new(brief, settings, "run_1", run_dir, logger, services);
//! let store = RunStore::new(&ctx.run_dir);
//!
//! let run = controller.run(&ctx, &mut RunState::default(), &store)?;
//! println!("Video: {:?}", run.asset("video"));
//! ```

mod controller;
mod errors;
mod stage;
pub mod stages;
mod store;
mod types;

pub use controller::{CancelHandle, StageController};
pub use errors::{PipelineError, PipelineResult, StageError, StageResult};
pub use stage::PipelineStage;
pub use stages::{
    AnalysisStage, AudioStage, CaptionsStage, PromptsStage, RenderStage, ScriptStage, VisualsStage,
};
pub use store::RunStore;
pub use types::{Context, ProgressCallback, RunState, StageOutcome};

/// Create a standard controller with all stages in pipeline order.
///
/// The standard pipeline executes these stages:
/// 1. Script - obtain the narration script
/// 2. Audio - synthesize the narration
/// 3. Analysis - transcribe and derive pacing chunks
/// 4. Prompts - build one image prompt per chunk
/// 5. Visuals - generate scene stills with durations
/// 6. Captions - lay out and write the subtitle file
/// 7. Render - compile the render graph and produce the video
pub fn create_standard_controller() -> StageController {
    StageController::new()
        .with_stage(ScriptStage::new())
        .with_stage(AudioStage::new())
        .with_stage(AnalysisStage::new())
        .with_stage(PromptsStage::new())
        .with_stage(VisualsStage::new())
        .with_stage(CaptionsStage::new())
        .with_stage(RenderStage::new())
}

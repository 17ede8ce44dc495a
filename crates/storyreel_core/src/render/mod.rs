//! Render graph construction and ffmpeg command compilation.
//!
//! This module turns pipeline outputs into an executable render plan:
//!
//! - **graph**: validates assets against the narration timeline and builds
//!   an ordered [`RenderGraph`] (motion, crossfades, audio mix, caption burn)
//! - **command**: compiles a graph into two-pass ffmpeg argument lists
//!
//! Neither half executes anything; the render collaborator owns process
//! execution.

mod command;
mod graph;

pub use command::{compile, FfmpegInvocation, RenderPlan};
pub use graph::{
    AudioMixNode, CaptionBurnNode, CrossfadeNode, MotionNode, RenderConfig, RenderError,
    RenderGraph, RenderGraphBuilder, RenderNode, RenderResult,
};

//! StoryReel Core - timing and synchronization engine for narrated video
//!
//! This crate contains all pipeline logic with zero UI dependencies:
//! pacing analysis, caption layout, render graph construction, and the
//! stage controller that sequences a run. Script generation, speech
//! synthesis, transcription, image generation, and render execution live
//! behind the trait seams in [`services`].

pub mod captions;
pub mod config;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod render;
pub mod services;
pub mod timing;

/// The version baked in at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

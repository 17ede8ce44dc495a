//! Data models for StoryReel.
//!
//! This module contains all core data structures used throughout the pipeline:
//! - Enums for pipeline stages, stage status, caption styles
//! - Timeline structures (word timestamps, pacing chunks, caption lines)
//! - The creative brief and the persisted run record

mod brief;
mod enums;
mod runs;
mod timeline;

pub use brief::{Brief, MusicTrack};
pub use enums::{Stage, StageStatus, StyleTag, TrailingSilence};
pub use runs::PipelineRun;
pub use timeline::{
    CaptionLine, NarrationAudio, PacingChunk, ScenePrompt, VisualAsset, WordTimestamp,
};

//! Narration pacing analysis.
//!
//! Turns word-level timestamps into pacing chunks: the contiguous slices
//! of the narration timeline that drive scene changes and image durations.

mod analyzer;

pub use analyzer::{build_pacing_chunks, verify_tiling, TimingConfig, TimingError};

//! Caption layout and subtitle generation.
//!
//! Lays word timestamps out into styled caption lines and renders them to
//! Advanced SubStation Alpha (.ass). Script headings are aligned against
//! the transcription by fuzzy matching and get their own style.

mod ass;
mod headings;
mod layout;
mod similarity;

pub use ass::{format_ass_time, write_ass, AssStyles};
pub use headings::{extract_headings, normalize_for_matching, strip_heading_markers};
pub use layout::{verify_coverage, CaptionConfig, CaptionError, CaptionLayout};
pub use similarity::{Similarity, TokenBlockSimilarity};

//! Core enums used throughout the pipeline.

use serde::{Deserialize, Serialize};

/// A pipeline stage, in fixed execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Narration script generation.
    Script,
    /// Narration audio synthesis.
    Audio,
    /// Word-level transcription and pacing analysis.
    Analysis,
    /// Scene prompt generation.
    Prompts,
    /// Visual asset generation.
    Visuals,
    /// Caption layout and subtitle file generation.
    Captions,
    /// Render graph construction and final render.
    Render,
}

impl Stage {
    /// Get the display name for this stage.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Audio => "audio",
            Self::Analysis => "analysis",
            Self::Prompts => "prompts",
            Self::Visuals => "visuals",
            Self::Captions => "captions",
            Self::Render => "render",
        }
    }

    /// Get all stages in execution order.
    pub fn all() -> &'static [Stage] {
        &[
            Self::Script,
            Self::Audio,
            Self::Analysis,
            Self::Prompts,
            Self::Visuals,
            Self::Captions,
            Self::Render,
        ]
    }

}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Status of a single stage within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    /// Not yet started.
    #[default]
    Pending,
    /// Currently executing.
    Running,
    /// Completed; output artifacts recorded.
    Done,
    /// Halted with an error.
    Failed,
}

impl StageStatus {
    /// Get the display name for this status.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Caption line style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleTag {
    /// Regular spoken line.
    #[default]
    Body,
    /// Section heading matched from the script.
    Heading,
}

impl std::fmt::Display for StyleTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StyleTag::Body => write!(f, "body"),
            StyleTag::Heading => write!(f, "heading"),
        }
    }
}

/// How silence after the last spoken word is attributed.
///
/// The pacing chunks must account for every millisecond of the narration
/// for the scene durations to line up with the audio. Silence at the tail
/// either stretches the final scene or is cut from the timeline entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingSilence {
    /// Extend the last chunk to the full narration duration.
    #[default]
    ExtendLast,
    /// End the last chunk at the last word; the tail is dropped.
    Discard,
}

impl TrailingSilence {
    /// Get the display name for this policy.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ExtendLast => "extend_last",
            Self::Discard => "discard",
        }
    }
}

impl std::fmt::Display for TrailingSilence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_is_linear() {
        let all = Stage::all();
        assert_eq!(all.len(), 7);
        assert_eq!(all[0], Stage::Script);
        assert_eq!(all[6], Stage::Render);
        assert!(all.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn stage_serializes_lowercase() {
        let json = serde_json::to_string(&Stage::Captions).unwrap();
        assert_eq!(json, "\"captions\"");
    }

    #[test]
    fn trailing_silence_uses_snake_case_tokens() {
        let json = serde_json::to_string(&TrailingSilence::ExtendLast).unwrap();
        assert_eq!(json, "\"extend_last\"");
        let policy: TrailingSilence = serde_json::from_str("\"discard\"").unwrap();
        assert_eq!(policy, TrailingSilence::Discard);
    }

    #[test]
    fn stage_status_deserializes_lowercase() {
        let status: StageStatus = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(status, StageStatus::Done);
    }
}

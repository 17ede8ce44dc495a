//! Timeline data structures (words, chunks, captions, scenes).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::enums::StyleTag;

/// A single transcribed word with its position in the narration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordTimestamp {
    /// The word as spoken.
    pub text: String,
    /// Start of the word in milliseconds from narration start.
    pub start_ms: u64,
    /// End of the word in milliseconds from narration start.
    pub end_ms: u64,
}

impl WordTimestamp {
    /// Create a new word timestamp.
    pub fn new(text: impl Into<String>, start_ms: u64, end_ms: u64) -> Self {
        Self {
            text: text.into(),
            start_ms,
            end_ms,
        }
    }

    /// Duration of the spoken word in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// A contiguous slice of the narration timeline that one scene covers.
///
/// Chunks are produced by the timing analyzer and tile the narration
/// without gaps or overlaps; a chunk's duration is what the matching
/// visual stays on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingChunk {
    /// The chunk's words joined by single spaces.
    pub raw_text: String,
    /// Start of the chunk in milliseconds from narration start.
    pub start_ms: u64,
    /// Length of the chunk in milliseconds.
    pub duration_ms: u64,
}

impl PacingChunk {
    /// End of the chunk in milliseconds from narration start.
    pub fn end_ms(&self) -> u64 {
        self.start_ms + self.duration_ms
    }
}

/// One laid-out caption line with its time span and style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionLine {
    /// The words shown on this line, in spoken order.
    pub words: Vec<WordTimestamp>,
    /// Start of the line (first word's start).
    pub start_ms: u64,
    /// End of the line (last word's end).
    pub end_ms: u64,
    /// Body or Heading.
    pub style_tag: StyleTag,
    /// Original heading text for display, when the line was matched
    /// against a script heading. Spoken words stay in `words`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_text: Option<String>,
}

impl CaptionLine {
    /// Create a body line from its words.
    pub fn body(words: Vec<WordTimestamp>) -> Self {
        let start_ms = words.first().map(|w| w.start_ms).unwrap_or(0);
        let end_ms = words.last().map(|w| w.end_ms).unwrap_or(start_ms);
        Self {
            words,
            start_ms,
            end_ms,
            style_tag: StyleTag::Body,
            heading_text: None,
        }
    }

    /// Create a heading line from its matched words and original text.
    pub fn heading(words: Vec<WordTimestamp>, heading_text: impl Into<String>) -> Self {
        let mut line = Self::body(words);
        line.style_tag = StyleTag::Heading;
        line.heading_text = Some(heading_text.into());
        line
    }

    /// The spoken words joined by single spaces.
    pub fn text(&self) -> String {
        let words: Vec<&str> = self.words.iter().map(|w| w.text.as_str()).collect();
        words.join(" ")
    }

    /// Text to render: the original heading when present, else the words.
    pub fn display_text(&self) -> String {
        match &self.heading_text {
            Some(text) => text.clone(),
            None => self.text(),
        }
    }

    /// Number of words on the line.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

/// An ordered visual (still image) with its on-screen duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualAsset {
    /// Path to the image file.
    pub path: PathBuf,
    /// Seconds the asset stays on screen (before crossfade overlap).
    pub duration_s: f64,
}

impl VisualAsset {
    /// Create a new visual asset.
    pub fn new(path: impl Into<PathBuf>, duration_s: f64) -> Self {
        Self {
            path: path.into(),
            duration_s,
        }
    }
}

/// A generated image prompt for one scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenePrompt {
    /// Scene index (matches the pacing chunk order).
    pub index: usize,
    /// The prompt text handed to the visual provider.
    pub prompt: String,
}

/// Synthesized narration audio returned by the speech collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationAudio {
    /// Path to the audio file.
    pub path: PathBuf,
    /// Total audio duration in milliseconds.
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_line_spans_its_words() {
        let line = CaptionLine::body(vec![
            WordTimestamp::new("hello", 100, 400),
            WordTimestamp::new("world", 450, 900),
        ]);
        assert_eq!(line.start_ms, 100);
        assert_eq!(line.end_ms, 900);
        assert_eq!(line.text(), "hello world");
        assert_eq!(line.style_tag, StyleTag::Body);
    }

    #[test]
    fn heading_line_displays_original_text() {
        let line = CaptionLine::heading(
            vec![WordTimestamp::new("chapter", 0, 300), WordTimestamp::new("one", 350, 600)],
            "Chapter One:",
        );
        assert_eq!(line.style_tag, StyleTag::Heading);
        assert_eq!(line.display_text(), "Chapter One:");
        assert_eq!(line.text(), "chapter one");
    }

    #[test]
    fn chunk_end_is_start_plus_duration() {
        let chunk = PacingChunk {
            raw_text: "hello".to_string(),
            start_ms: 1200,
            duration_ms: 800,
        };
        assert_eq!(chunk.end_ms(), 2000);
    }
}

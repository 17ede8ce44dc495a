//! The creative brief that seeds a run.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_music_volume() -> f64 {
    0.15
}

/// Background music request: file plus mix ratio against the narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicTrack {
    /// Path to the music file.
    pub path: PathBuf,
    /// Linear volume applied to the music in the mix (1.0 = unchanged).
    #[serde(default = "default_music_volume")]
    pub volume: f64,
}

/// Everything the user supplies to produce one video.
///
/// The brief feeds the script collaborator and carries optional source
/// hints ("script", "narration", "words", "images") that local collaborator
/// implementations resolve instead of calling external services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brief {
    /// Subject matter for the script.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Keywords the script should work in.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Narration tone (e.g. "calm", "enthusiastic").
    #[serde(default)]
    pub tone: String,
    /// Requested script length in words.
    #[serde(default = "Brief::default_word_count")]
    pub target_word_count: u32,
    /// Free-form visual style direction for scene prompts.
    #[serde(default)]
    pub creative_brief: String,
    /// Final video file name; a timestamped default is used when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,
    /// Optional background music.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music: Option<MusicTrack>,
    /// Named source files for local collaborator implementations.
    #[serde(default)]
    pub sources: HashMap<String, PathBuf>,
}

impl Brief {
    fn default_word_count() -> u32 {
        150
    }

    /// Look up a named source hint.
    pub fn source(&self, name: &str) -> Option<&PathBuf> {
        self.sources.get(name)
    }
}

impl Default for Brief {
    fn default() -> Self {
        Self {
            topics: Vec::new(),
            keywords: Vec::new(),
            tone: String::new(),
            target_word_count: Self::default_word_count(),
            creative_brief: String::new(),
            output_filename: None,
            music: None,
            sources: HashMap::new(),
        }
    }
}

//! Local collaborator implementations.
//!
//! Nothing here calls a hosted service: scripts, narration, and word
//! timestamps come from files named in the brief's source hints, visuals
//! come from a directory (with generated placeholders as fallback), and
//! rendering shells out to ffmpeg. Swapping any of these for a real
//! provider is a matter of implementing the same trait.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::anyhow;
use serde::Deserialize;

use storyreel_core::config::Settings;
use storyreel_core::models::{Brief, NarrationAudio, PacingChunk, WordTimestamp};
use storyreel_core::orchestrator::{StageError, StageResult};
use storyreel_core::render::RenderPlan;
use storyreel_core::services::{
    PromptService, RenderService, ScriptService, ServiceSet, SpeechService, TranscriptionService,
    VisualService,
};

/// Lines of ffmpeg/ffprobe stderr kept when a command fails.
const STDERR_TAIL_LINES: usize = 15;

/// Build the collaborator set for a brief.
///
/// Requires the "script", "narration", and "words" source hints; the
/// optional "images" hint selects directory-backed visuals with a
/// placeholder fallback, otherwise every scene gets a placeholder.
pub fn local_services(brief: &Brief, settings: &Settings) -> anyhow::Result<ServiceSet> {
    let narration = brief
        .source("narration")
        .cloned()
        .ok_or_else(|| anyhow!("Brief is missing the 'narration' source hint"))?;
    let words = brief
        .source("words")
        .cloned()
        .ok_or_else(|| anyhow!("Brief is missing the 'words' source hint"))?;

    let visuals: Box<dyn VisualService> = match brief.source("images") {
        Some(dir) => Box::new(FallbackVisuals::new(
            DirectoryVisualService::new(dir.clone()),
            PlaceholderVisualService::new(settings.render.width, settings.render.height),
        )),
        None => Box::new(PlaceholderVisualService::new(
            settings.render.width,
            settings.render.height,
        )),
    };

    Ok(ServiceSet {
        script: Box::new(FileScriptService),
        speech: Box::new(PreRenderedSpeechService::new(narration)),
        transcription: Box::new(JsonTranscriptionService::new(words)),
        prompts: Box::new(TemplatePromptService),
        visuals,
        render: Box::new(FfmpegRenderService),
    })
}

/// Reads the narration script from the brief's "script" source hint.
pub struct FileScriptService;

impl ScriptService for FileScriptService {
    fn generate(&self, brief: &Brief) -> StageResult<String> {
        let path = brief
            .source("script")
            .ok_or_else(|| StageError::invalid_input("Brief has no 'script' source hint"))?;
        std::fs::read_to_string(path).map_err(|e| StageError::io_error("reading script file", e))
    }
}

/// Copies a pre-rendered narration recording into the run and probes its
/// duration with ffprobe. The probed duration drives all downstream
/// timing, so the recording must match the script it stands in for.
pub struct PreRenderedSpeechService {
    source: PathBuf,
}

impl PreRenderedSpeechService {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl SpeechService for PreRenderedSpeechService {
    fn synthesize(&self, _script: &str, out_path: &Path) -> StageResult<NarrationAudio> {
        if !self.source.exists() {
            return Err(StageError::file_not_found(
                self.source.display().to_string(),
            ));
        }
        std::fs::copy(&self.source, out_path)
            .map_err(|e| StageError::io_error("copying narration recording", e))?;

        let duration_ms = probe_duration_ms(out_path)?;
        Ok(NarrationAudio {
            path: out_path.to_path_buf(),
            duration_ms,
        })
    }
}

/// Measure a media file's duration in milliseconds.
fn probe_duration_ms(path: &Path) -> StageResult<u64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .map_err(|e| StageError::io_error("executing ffprobe", e))?;

    if !output.status.success() {
        return Err(StageError::command_failed(
            "ffprobe",
            output.status.code().unwrap_or(-1),
            stderr_tail(&output.stderr),
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let seconds: f64 = stdout
        .trim()
        .parse()
        .map_err(|_| StageError::parse_error("ffprobe duration", stdout.trim().to_string()))?;
    Ok((seconds * 1000.0).round() as u64)
}

/// Reads word timestamps from the brief's "words" JSON file.
///
/// Accepts either a flat array of `{text, start_ms, end_ms}` objects or
/// a whisper-style transcript (`segments[].words[]` with seconds).
pub struct JsonTranscriptionService {
    source: PathBuf,
}

impl JsonTranscriptionService {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl TranscriptionService for JsonTranscriptionService {
    fn transcribe(&self, _audio: &NarrationAudio) -> StageResult<Vec<WordTimestamp>> {
        let content = std::fs::read_to_string(&self.source)
            .map_err(|e| StageError::io_error("reading words file", e))?;

        if let Ok(words) = serde_json::from_str::<Vec<WordTimestamp>>(&content) {
            return Ok(words);
        }

        let transcript: WhisperTranscript = serde_json::from_str(&content)
            .map_err(|e| StageError::parse_error("words file", e.to_string()))?;
        Ok(transcript.into_words())
    }
}

#[derive(Deserialize)]
struct WhisperTranscript {
    segments: Vec<WhisperSegment>,
}

#[derive(Deserialize)]
struct WhisperSegment {
    #[serde(default)]
    words: Vec<WhisperWord>,
}

#[derive(Deserialize)]
struct WhisperWord {
    word: String,
    start: f64,
    end: f64,
}

impl WhisperTranscript {
    fn into_words(self) -> Vec<WordTimestamp> {
        self.segments
            .into_iter()
            .flat_map(|segment| segment.words)
            .filter_map(|word| {
                // Whisper pads word tokens with leading spaces.
                let text = word.word.trim();
                if text.is_empty() {
                    return None;
                }
                Some(WordTimestamp::new(
                    text,
                    (word.start * 1000.0).round() as u64,
                    (word.end * 1000.0).round() as u64,
                ))
            })
            .collect()
    }
}

/// Composes scene prompts from the brief's style direction and the
/// chunk's spoken text.
pub struct TemplatePromptService;

impl PromptService for TemplatePromptService {
    fn scene_prompt(&self, chunk: &PacingChunk, brief: &Brief) -> StageResult<String> {
        let mut prompt = String::new();
        if !brief.creative_brief.is_empty() {
            prompt.push_str(&brief.creative_brief);
            prompt.push_str(". ");
        }
        prompt.push_str("Scene: ");
        prompt.push_str(&chunk.raw_text);
        if !brief.keywords.is_empty() {
            prompt.push_str(". Style: ");
            prompt.push_str(&brief.keywords.join(", "));
        }
        Ok(prompt)
    }
}

/// Serves scene images from a directory, in sorted filename order.
///
/// Scene N gets the Nth image; asking past the end is an error, which
/// lets a fallback provider fill the gap.
pub struct DirectoryVisualService {
    source_dir: PathBuf,
}

impl DirectoryVisualService {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
        }
    }

    fn sorted_images(&self) -> StageResult<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.source_dir)
            .map_err(|e| StageError::io_error("listing image directory", e))?;

        let mut images: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("png") | Some("jpg") | Some("jpeg") | Some("webp")
                )
            })
            .collect();
        images.sort();
        Ok(images)
    }
}

impl VisualService for DirectoryVisualService {
    fn generate(&self, _prompt: &str, index: usize, out_dir: &Path) -> StageResult<PathBuf> {
        let images = self.sorted_images()?;
        let source = images.get(index).ok_or_else(|| {
            StageError::invalid_input(format!(
                "Image directory holds {} images, scene {} requested",
                images.len(),
                index
            ))
        })?;

        let extension = source.extension().and_then(|e| e.to_str()).unwrap_or("png");
        let dest = out_dir.join(format!("scene_{index:03}.{extension}"));
        std::fs::copy(source, &dest)
            .map_err(|e| StageError::io_error("copying scene image", e))?;
        Ok(dest)
    }
}

/// Renders a flat-colour frame with ffmpeg when no real image exists.
///
/// Adjacent scenes cycle through a small palette so crossfades between
/// placeholders stay visible.
pub struct PlaceholderVisualService {
    width: u32,
    height: u32,
}

impl PlaceholderVisualService {
    const PALETTE: [&'static str; 5] = ["0x1d3557", "0x457b9d", "0x2a9d8f", "0x8338ec", "0x264653"];

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl VisualService for PlaceholderVisualService {
    fn generate(&self, _prompt: &str, index: usize, out_dir: &Path) -> StageResult<PathBuf> {
        let dest = out_dir.join(format!("scene_{index:03}.png"));
        let colour = Self::PALETTE[index % Self::PALETTE.len()];
        let spec = format!("color=c={}:s={}x{}", colour, self.width, self.height);

        let output = Command::new("ffmpeg")
            .args(["-y", "-f", "lavfi", "-i", &spec, "-frames:v", "1"])
            .arg(&dest)
            .output()
            .map_err(|e| StageError::io_error("executing ffmpeg", e))?;

        if !output.status.success() {
            return Err(StageError::command_failed(
                "ffmpeg",
                output.status.code().unwrap_or(-1),
                stderr_tail(&output.stderr),
            ));
        }
        Ok(dest)
    }
}

/// Tries a primary visual provider, falling back per scene on error.
pub struct FallbackVisuals {
    primary: Box<dyn VisualService>,
    fallback: Box<dyn VisualService>,
}

impl FallbackVisuals {
    pub fn new(
        primary: impl VisualService + 'static,
        fallback: impl VisualService + 'static,
    ) -> Self {
        Self {
            primary: Box::new(primary),
            fallback: Box::new(fallback),
        }
    }
}

impl VisualService for FallbackVisuals {
    fn generate(&self, prompt: &str, index: usize, out_dir: &Path) -> StageResult<PathBuf> {
        match self.primary.generate(prompt, index, out_dir) {
            Ok(path) => Ok(path),
            Err(error) => {
                tracing::warn!("Primary visual provider failed for scene {index}: {error}");
                self.fallback.generate(prompt, index, out_dir)
            }
        }
    }
}

/// Executes a compiled two-pass plan by spawning ffmpeg.
pub struct FfmpegRenderService;

impl RenderService for FfmpegRenderService {
    fn execute(&self, plan: &RenderPlan) -> StageResult<PathBuf> {
        run_ffmpeg(&plan.assemble.args)?;
        run_ffmpeg(&plan.burn.args)?;
        Ok(plan.burn.output.clone())
    }
}

fn run_ffmpeg(args: &[String]) -> StageResult<()> {
    let output = Command::new("ffmpeg")
        .args(args)
        .output()
        .map_err(|e| StageError::io_error("executing ffmpeg", e))?;

    if !output.status.success() {
        return Err(StageError::command_failed(
            "ffmpeg",
            output.status.code().unwrap_or(-1),
            stderr_tail(&output.stderr),
        ));
    }
    Ok(())
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

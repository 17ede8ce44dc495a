//! Settings sections and their serde mappings.
//!
//! Each struct here becomes one TOML table, and each table can be written
//! back on its own. The engine-facing sections also know how to produce
//! the config structs the timing, caption, and render modules consume.

use serde::{Deserialize, Serialize};

use crate::captions::{AssStyles, CaptionConfig};
use crate::models::TrailingSilence;
use crate::render::RenderConfig;
use crate::timing::TimingConfig;

/// Everything configurable, one field per TOML table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Where runs and logs land.
    #[serde(default)]
    pub paths: PathSettings,

    /// Run log verbosity and echo options.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Pacing analysis settings.
    #[serde(default)]
    pub timing: TimingSettings,

    /// Caption layout and style settings.
    #[serde(default)]
    pub captions: CaptionSettings,

    /// Render graph settings.
    #[serde(default)]
    pub render: RenderSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            paths: PathSettings::default(),
            logging: LoggingSettings::default(),
            timing: TimingSettings::default(),
            captions: CaptionSettings::default(),
            render: RenderSettings::default(),
        }
    }
}

/// Path configuration for run output and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Folder that holds one subdirectory per run.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Folder for application-level log files.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: String,
}

fn default_output_dir() -> String {
    "storyreel_output".to_string()
}

fn default_logs_dir() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            logs_dir: default_logs_dir(),
        }
    }
}

/// Run log behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Suppress per-line tool output in the run log.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// How many buffered output lines a failure replays.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Log progress only when it crosses a multiple of this percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Show timestamps in run log output.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,

    /// Echo compiled ffmpeg arguments in pretty format.
    #[serde(default)]
    pub show_render_args_pretty: bool,

    /// Echo compiled ffmpeg arguments as raw JSON.
    #[serde(default)]
    pub show_render_args_json: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            show_timestamps: true,
            show_render_args_pretty: false,
            show_render_args_json: false,
        }
    }
}

/// Pacing analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSettings {
    /// Silence between words (ms) that forces a scene break.
    #[serde(default = "default_silence_gap")]
    pub silence_gap_ms: u64,

    /// Chunks shorter than this (ms) merge into their predecessor.
    #[serde(default = "default_min_chunk")]
    pub min_chunk_ms: u64,

    /// Maximum spoken span (ms) a single chunk may cover.
    #[serde(default = "default_max_chunk")]
    pub max_chunk_ms: u64,

    /// What happens to silence after the last word.
    #[serde(default)]
    pub trailing_silence: TrailingSilence,
}

fn default_silence_gap() -> u64 {
    500
}

fn default_min_chunk() -> u64 {
    1000
}

fn default_max_chunk() -> u64 {
    15_000
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            silence_gap_ms: default_silence_gap(),
            min_chunk_ms: default_min_chunk(),
            max_chunk_ms: default_max_chunk(),
            trailing_silence: TrailingSilence::default(),
        }
    }
}

impl TimingSettings {
    /// Build the analyzer configuration from this section.
    pub fn timing_config(&self) -> TimingConfig {
        TimingConfig::from_settings(
            self.silence_gap_ms,
            self.min_chunk_ms,
            self.max_chunk_ms,
            self.trailing_silence,
        )
    }
}

/// Caption layout and ASS style configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionSettings {
    /// Maximum words on a body line.
    #[serde(default = "default_max_words_per_line")]
    pub max_words_per_line: usize,

    /// Maximum span (ms) a body line may cover.
    #[serde(default = "default_max_line_duration")]
    pub max_line_duration_ms: u64,

    /// Gap between words (ms) that forces a line break.
    #[serde(default = "default_gap_threshold")]
    pub gap_threshold_ms: u64,

    /// Minimum similarity for a word window to count as a heading.
    #[serde(default = "default_heading_threshold")]
    pub heading_match_threshold: f64,

    /// Subtitle play resolution width.
    #[serde(default = "default_play_res_x")]
    pub play_res_x: u32,

    /// Subtitle play resolution height.
    #[serde(default = "default_play_res_y")]
    pub play_res_y: u32,

    /// Font for both subtitle styles.
    #[serde(default = "default_font_name")]
    pub font_name: String,

    /// Body font size.
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Body text colour (ASS `&HAABBGGRR`).
    #[serde(default = "default_primary_colour")]
    pub primary_colour: String,

    /// Outline colour for both styles.
    #[serde(default = "default_outline_colour")]
    pub outline_colour: String,

    /// Body box colour.
    #[serde(default = "default_back_colour")]
    pub back_colour: String,

    /// Body alignment (numpad layout).
    #[serde(default = "default_alignment")]
    pub alignment: u32,

    /// Heading font size.
    #[serde(default = "default_heading_font_size")]
    pub heading_font_size: u32,

    /// Heading text colour.
    #[serde(default = "default_heading_primary_colour")]
    pub heading_primary_colour: String,

    /// Heading box colour.
    #[serde(default = "default_heading_back_colour")]
    pub heading_back_colour: String,

    /// Heading alignment (numpad layout).
    #[serde(default = "default_heading_alignment")]
    pub heading_alignment: u32,
}

fn default_max_words_per_line() -> usize {
    7
}

fn default_max_line_duration() -> u64 {
    12_000
}

fn default_gap_threshold() -> u64 {
    400
}

fn default_heading_threshold() -> f64 {
    0.7
}

fn default_play_res_x() -> u32 {
    1920
}

fn default_play_res_y() -> u32 {
    1080
}

fn default_font_name() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u32 {
    72
}

fn default_primary_colour() -> String {
    "&H00FFFFFF".to_string()
}

fn default_outline_colour() -> String {
    "&H00000000".to_string()
}

fn default_back_colour() -> String {
    "&H99000000".to_string()
}

fn default_alignment() -> u32 {
    2
}

fn default_heading_font_size() -> u32 {
    86
}

fn default_heading_primary_colour() -> String {
    "&H00FFFF00".to_string()
}

fn default_heading_back_colour() -> String {
    "&H60000000".to_string()
}

fn default_heading_alignment() -> u32 {
    5
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            max_words_per_line: default_max_words_per_line(),
            max_line_duration_ms: default_max_line_duration(),
            gap_threshold_ms: default_gap_threshold(),
            heading_match_threshold: default_heading_threshold(),
            play_res_x: default_play_res_x(),
            play_res_y: default_play_res_y(),
            font_name: default_font_name(),
            font_size: default_font_size(),
            primary_colour: default_primary_colour(),
            outline_colour: default_outline_colour(),
            back_colour: default_back_colour(),
            alignment: default_alignment(),
            heading_font_size: default_heading_font_size(),
            heading_primary_colour: default_heading_primary_colour(),
            heading_back_colour: default_heading_back_colour(),
            heading_alignment: default_heading_alignment(),
        }
    }
}

impl CaptionSettings {
    /// Build the layout configuration from this section.
    pub fn layout_config(&self) -> CaptionConfig {
        CaptionConfig {
            max_words_per_line: self.max_words_per_line,
            max_line_duration_ms: self.max_line_duration_ms,
            gap_threshold_ms: self.gap_threshold_ms,
            heading_match_threshold: self.heading_match_threshold,
        }
    }

    /// Build the ASS style set from this section.
    pub fn ass_styles(&self) -> AssStyles {
        AssStyles {
            play_res_x: self.play_res_x,
            play_res_y: self.play_res_y,
            font_name: self.font_name.clone(),
            font_size: self.font_size,
            primary_colour: self.primary_colour.clone(),
            outline_colour: self.outline_colour.clone(),
            back_colour: self.back_colour.clone(),
            alignment: self.alignment,
            heading_font_size: self.heading_font_size,
            heading_primary_colour: self.heading_primary_colour.clone(),
            heading_back_colour: self.heading_back_colour.clone(),
            heading_alignment: self.heading_alignment,
        }
    }
}

/// Render graph configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Crossfade overlap between adjacent scenes (ms).
    #[serde(default = "default_crossfade")]
    pub crossfade_ms: u64,

    /// Output frame rate.
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Output width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Output height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Peak zoom scale of the motion effect (1.0 disables zoom).
    #[serde(default = "default_zoom_max_scale")]
    pub zoom_max_scale: f64,

    /// Zoom in/out cycles per scene.
    #[serde(default = "default_zoom_cycles")]
    pub zoom_cycles: f64,

    /// Video codec handed to the encoder.
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Audio codec handed to the encoder.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Output pixel format.
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Allowed gap (ms) between assembled video length and narration length.
    #[serde(default = "default_duration_tolerance")]
    pub duration_tolerance_ms: u64,
}

fn default_crossfade() -> u64 {
    1000
}

fn default_fps() -> u32 {
    30
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

fn default_zoom_max_scale() -> f64 {
    1.05
}

fn default_zoom_cycles() -> f64 {
    0.5
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_pixel_format() -> String {
    "yuv420p".to_string()
}

fn default_duration_tolerance() -> u64 {
    150
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            crossfade_ms: default_crossfade(),
            fps: default_fps(),
            width: default_width(),
            height: default_height(),
            zoom_max_scale: default_zoom_max_scale(),
            zoom_cycles: default_zoom_cycles(),
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            pixel_format: default_pixel_format(),
            duration_tolerance_ms: default_duration_tolerance(),
        }
    }
}

impl RenderSettings {
    /// Build the render graph configuration from this section.
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            crossfade_ms: self.crossfade_ms,
            fps: self.fps,
            width: self.width,
            height: self.height,
            zoom_max_scale: self.zoom_max_scale,
            zoom_cycles: self.zoom_cycles,
            video_codec: self.video_codec.clone(),
            audio_codec: self.audio_codec.clone(),
            pixel_format: self.pixel_format.clone(),
            duration_tolerance_ms: self.duration_tolerance_ms,
        }
    }
}

/// Selector for saving a single TOML table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Logging,
    Timing,
    Captions,
    Render,
}

impl ConfigSection {
    /// The TOML table this section serializes into.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Timing => "timing",
            ConfigSection::Captions => "captions",
            ConfigSection::Render => "render",
        }
    }
}

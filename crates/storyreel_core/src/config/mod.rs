//! Configuration management for StoryReel.
//!
//! Settings live in one TOML file split into per-concern tables. The
//! manager creates the file with annotated defaults on first use, scrubs
//! unknown tables on load, and writes through a temp file plus rename so
//! a crash never leaves the config torn. Individual tables can be saved
//! back without disturbing hand edits elsewhere in the file.
//!
//! # Example
//!
//! ```no_run
//! use storyreel_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/storyreel.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Output dir: {}", config.settings().paths.output_dir);
//!
//! // Change one value and save only its table
//! config.settings_mut().timing.silence_gap_ms = 750;
//! config.update_section(ConfigSection::Timing).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    CaptionSettings, ConfigSection, LoggingSettings, PathSettings, RenderSettings, Settings,
    TimingSettings,
};

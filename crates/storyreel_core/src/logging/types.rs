//! Log levels, configuration, and message prefixes for the run log.

use serde::{Deserialize, Serialize};

/// Severity threshold for run log messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum LogLevel {
    /// Everything, including per-word detail.
    Trace,
    /// Stage internals useful when debugging a run.
    Debug,
    /// Normal run narration.
    #[default]
    Info,
    /// Something recoverable went sideways.
    Warn,
    /// A stage or the run failed.
    Error,
}

impl LogLevel {
    /// The equivalent `tracing` level, for bridging into the global subscriber.
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Behavior knobs for a run logger.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Messages below this level are dropped.
    pub level: LogLevel,
    /// Compact mode: progress lines are throttled and command output
    /// goes only to the tail buffer.
    pub compact: bool,
    /// Progress is logged at multiples of this percentage.
    pub progress_step: u32,
    /// How many command output lines the tail buffer retains.
    pub error_tail: usize,
    /// Prefix each line with a wall-clock timestamp.
    pub show_timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            progress_step: 20,
            error_tail: 20,
            show_timestamps: true,
        }
    }
}

impl LogConfig {
    /// Verbose preset: everything through, nothing throttled.
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
            compact: false,
            progress_step: 5,
            error_tail: 40,
            show_timestamps: true,
        }
    }

    /// Build from the `[logging]` settings section.
    pub fn from_settings(settings: &crate::config::LoggingSettings) -> Self {
        Self {
            level: LogLevel::Info,
            compact: settings.compact,
            progress_step: settings.progress_step,
            error_tail: settings.error_tail as usize,
            show_timestamps: settings.show_timestamps,
        }
    }
}

/// Type alias for the log observer callback.
///
/// The callback receives each formatted log line; the CLI uses it to
/// mirror the run log onto the console.
pub type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Line prefixes that keep the run log grep-able.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePrefix {
    /// An external command line, rendered as `$ command`.
    Command,
    /// Stage boundary, rendered as `=== name ===`.
    Phase,
    /// Subsection within a stage, rendered as `--- name ---`.
    Section,
    /// Post-stage check result, rendered as `[Validation]`.
    Validation,
    /// `[SUCCESS]`
    Success,
    /// `[WARNING]`
    Warning,
    /// `[ERROR]`
    Error,
    /// `[DEBUG]`
    Debug,
    /// Plain text, no prefix.
    None,
}

impl MessagePrefix {
    /// Apply the prefix to a message.
    pub fn format(&self, message: &str) -> String {
        match self {
            MessagePrefix::Command => format!("$ {message}"),
            MessagePrefix::Phase => format!("=== {message} ==="),
            MessagePrefix::Section => format!("--- {message} ---"),
            MessagePrefix::Validation => format!("[Validation] {message}"),
            MessagePrefix::Success => format!("[SUCCESS] {message}"),
            MessagePrefix::Warning => format!("[WARNING] {message}"),
            MessagePrefix::Error => format!("[ERROR] {message}"),
            MessagePrefix::Debug => format!("[DEBUG] {message}"),
            MessagePrefix::None => message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_order_by_severity() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn prefixes_format_messages() {
        assert_eq!(
            MessagePrefix::Command.format("ffmpeg -y -i in.wav"),
            "$ ffmpeg -y -i in.wav"
        );
        assert_eq!(MessagePrefix::Phase.format("audio"), "=== audio ===");
        assert_eq!(MessagePrefix::None.format("plain line"), "plain line");
    }

    #[test]
    fn config_builds_from_settings_section() {
        let mut section = crate::config::LoggingSettings::default();
        section.compact = false;
        section.error_tail = 40;

        let config = LogConfig::from_settings(&section);
        assert!(!config.compact);
        assert_eq!(config.error_tail, 40);
        assert_eq!(config.level, LogLevel::Info);
    }
}

//! Run logging.
//!
//! Two layers share this module. The [`RunLogger`] owns a run's `run.log`
//! file and optionally mirrors every line to an observer callback; the
//! pipeline stages write their narration through it. [`init_tracing`] wires
//! up the process-wide `tracing` subscriber that library-level diagnostics
//! go to.
//!
//! # Example
//!
//! ```no_run
//! use storyreel_core::logging::{LogLevel, RunLoggerBuilder};
//!
//! let logger = RunLoggerBuilder::new("run_20250101_093000", "out/run_20250101_093000")
//!     .level(LogLevel::Debug)
//!     .build()
//!     .unwrap();
//!
//! logger.phase("audio");
//! logger.progress(40);
//! logger.success("narration rendered");
//! ```

mod run_logger;
mod types;

pub use run_logger::{RunLogger, RunLoggerBuilder};
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::EnvFilter;

/// Install the process-wide `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` becomes the filter.
/// Output goes to stderr so it never mixes with pipeline stdout. Call once
/// at startup; repeat calls are ignored.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn filter_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_level_maps_to_a_directive() {
        let levels = [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ];
        for level in levels {
            assert!(!filter_directive(level).is_empty());
        }
        assert_eq!(filter_directive(LogLevel::Warn), "warn");
    }
}

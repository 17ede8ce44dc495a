//! Per-run logger.
//!
//! Every pipeline run writes its own `run.log` inside the run directory.
//! Lines are mirrored to an observer callback when one is attached, and a
//! bounded tail of external-command output is kept around so a failing
//! ffmpeg call can be diagnosed without re-running it.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

/// Writes a run's log to file and mirrors it to an observer.
pub struct RunLogger {
    run_id: String,
    log_path: PathBuf,
    /// Buffered `run.log` writer; `None` once the logger is closed.
    writer: Arc<Mutex<Option<BufWriter<File>>>>,
    callback: Arc<Mutex<Option<LogCallback>>>,
    config: LogConfig,
    /// Recent external-command output, bounded by `config.error_tail`.
    tail: Arc<Mutex<VecDeque<String>>>,
    /// Highest progress percentage logged so far (compact throttling).
    progress_mark: Arc<Mutex<u32>>,
}

impl RunLogger {
    /// Create a new run logger writing `run.log` inside `run_dir`.
    ///
    /// The run directory is created if it does not exist.
    pub fn new(
        run_id: impl Into<String>,
        run_dir: impl AsRef<Path>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Self> {
        let run_id = run_id.into();
        let run_dir = run_dir.as_ref();
        fs::create_dir_all(run_dir)?;

        let log_path = run_dir.join("run.log");
        let writer = BufWriter::new(File::create(&log_path)?);

        Ok(Self {
            run_id,
            log_path,
            writer: Arc::new(Mutex::new(Some(writer))),
            callback: Arc::new(Mutex::new(callback)),
            config,
            tail: Arc::new(Mutex::new(VecDeque::new())),
            progress_mark: Arc::new(Mutex::new(0)),
        })
    }

    /// The run this logger belongs to.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Where `run.log` lives.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Log a message at the given level.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }
        self.emit(&self.stamp(message));
    }

    /// Info-level message, no prefix.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Debug-level message, no prefix.
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    /// Log a warning.
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &MessagePrefix::Warning.format(message));
    }

    /// Log an error.
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &MessagePrefix::Error.format(message));
    }

    /// Log an external command about to be executed.
    pub fn command(&self, command: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Command.format(command));
    }

    /// Log a phase marker (one per pipeline stage).
    pub fn phase(&self, phase_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Phase.format(phase_name));
    }

    /// Log a section marker within a phase.
    pub fn section(&self, section_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Section.format(section_name));
    }

    /// Log a `[SUCCESS]` line.
    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// Log a validation result.
    pub fn validation(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Validation.format(message));
    }

    /// Log a progress update.
    ///
    /// In compact mode only step-interval crossings are logged; returns
    /// whether the line was written. 100% always goes through.
    pub fn progress(&self, percent: u32) -> bool {
        if self.config.compact {
            let mut mark = self.progress_mark.lock();
            let step = self.config.progress_step.max(1);
            let crossed = percent / step > *mark / step;
            if !crossed && percent < 100 {
                return false;
            }
            *mark = percent;
        }
        self.log(LogLevel::Info, &format!("Progress: {}%", percent));
        true
    }

    /// Record one line of external-command output.
    ///
    /// The line always lands in the tail buffer. In compact mode it goes
    /// nowhere else; otherwise it is logged, stderr lines tagged.
    pub fn output_line(&self, line: &str, is_stderr: bool) {
        {
            let mut tail = self.tail.lock();
            while tail.len() >= self.config.error_tail {
                tail.pop_front();
            }
            tail.push_back(line.to_string());
        }

        if self.config.compact {
            return;
        }
        let tagged = if is_stderr {
            format!("[stderr] {line}")
        } else {
            line.to_string()
        };
        self.emit(&self.stamp(&tagged));
    }

    /// Replay the tail buffer into the log, typically after a command fails.
    pub fn show_tail(&self, header: &str) {
        let tail = self.tail.lock();
        if tail.is_empty() {
            return;
        }
        self.emit(&self.stamp(&format!("[{}/tail]", header)));
        for line in tail.iter() {
            self.emit(&self.stamp(line));
        }
    }

    /// Drop everything buffered so far.
    pub fn clear_tail(&self) {
        self.tail.lock().clear();
    }

    /// Snapshot of the tail buffer, oldest line first.
    pub fn get_tail(&self) -> Vec<String> {
        self.tail.lock().iter().cloned().collect()
    }

    /// Log a compiled ffmpeg argument list, one flag per line.
    pub fn log_render_args_pretty(&self, pass_name: &str, args: &[String]) {
        self.section(&format!("{pass_name} args"));
        self.info(&args.join(" \\\n  "));
    }

    /// Log a compiled ffmpeg argument list as a JSON array.
    pub fn log_render_args_json(&self, pass_name: &str, args: &[String]) {
        self.section(&format!("{pass_name} args (json)"));
        if let Ok(json) = serde_json::to_string_pretty(args) {
            self.info(&json);
        }
    }

    /// Push buffered lines out to disk.
    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.writer.lock() {
            let _ = writer.flush();
        }
    }

    /// Flush and release the file handle. Logging after this is a no-op.
    pub fn close(&self) {
        self.flush();
        *self.writer.lock() = None;
    }

    fn stamp(&self, message: &str) -> String {
        if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
        } else {
            message.to_string()
        }
    }

    fn emit(&self, line: &str) {
        if let Some(ref mut writer) = *self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
        }
        if let Some(ref callback) = *self.callback.lock() {
            callback(line);
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Fluent construction for [`RunLogger`].
pub struct RunLoggerBuilder {
    run_id: String,
    run_dir: PathBuf,
    config: LogConfig,
    callback: Option<LogCallback>,
}

impl RunLoggerBuilder {
    /// Start a builder for the given run.
    pub fn new(run_id: impl Into<String>, run_dir: impl Into<PathBuf>) -> Self {
        Self {
            run_id: run_id.into(),
            run_dir: run_dir.into(),
            config: LogConfig::default(),
            callback: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Override just the level.
    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    /// Override compact mode.
    pub fn compact(mut self, compact: bool) -> Self {
        self.config.compact = compact;
        self
    }

    /// Override the progress step percentage.
    pub fn progress_step(mut self, step: u32) -> Self {
        self.config.progress_step = step;
        self
    }

    /// Attach an observer that sees every emitted line.
    pub fn callback(mut self, callback: LogCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Open the log file and hand back the logger.
    pub fn build(self) -> std::io::Result<RunLogger> {
        RunLogger::new(self.run_id, self.run_dir, self.config, self.callback)
    }
}

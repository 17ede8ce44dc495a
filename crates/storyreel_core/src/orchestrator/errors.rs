//! Error types for the pipeline orchestrator.
//!
//! A failure surfaces as a [`PipelineError`] naming the run, wrapping a
//! [`StageError`] naming the stage and operation that broke.

use std::io;

use thiserror::Error;

use crate::captions::CaptionError;
use crate::models::Stage;
use crate::render::RenderError;
use crate::timing::TimingError;

/// Top-level pipeline error with run context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A stage failed during execution.
    #[error("Run '{run_id}' failed at stage '{stage}': {source}")]
    StageFailed {
        run_id: String,
        stage: Stage,
        #[source]
        source: StageError,
    },

    /// Input validation failed before the pipeline started.
    #[error("Run '{run_id}' failed validation: {message}")]
    ValidationFailed { run_id: String, message: String },

    /// The run was cancelled.
    #[error("Run '{run_id}' was cancelled")]
    Cancelled { run_id: String },

    /// Failed to set up the run (create directories, persist state, etc.).
    #[error("Run '{run_id}' setup failed: {message}")]
    SetupFailed { run_id: String, message: String },
}

impl PipelineError {
    /// Create a stage failed error.
    pub fn stage_failed(run_id: impl Into<String>, stage: Stage, source: StageError) -> Self {
        Self::StageFailed {
            run_id: run_id.into(),
            stage,
            source,
        }
    }

    /// Validation failure before any stage ran.
    pub fn validation_failed(run_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            run_id: run_id.into(),
            message: message.into(),
        }
    }

    /// Failure while preparing the run directory or persisting state.
    pub fn setup_failed(run_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            run_id: run_id.into(),
            message: message.into(),
        }
    }

    /// Cancellation of the given run.
    pub fn cancelled(run_id: impl Into<String>) -> Self {
        Self::Cancelled {
            run_id: run_id.into(),
        }
    }
}

/// Error from a pipeline stage with operation context.
#[derive(Error, Debug)]
pub enum StageError {
    /// The stage rejected the state it was handed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// The stage produced something it refuses to pass downstream.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// An external tool exited non-zero.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// I/O failure tagged with the operation that attempted it.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// An expected input or artifact file is missing from disk.
    #[error("Required file not found: {path}")]
    FileNotFound { path: String },

    /// Parsing error (e.g., JSON artifacts).
    #[error("Failed to parse {what}: {message}")]
    ParseError { what: String, message: String },

    /// Pacing analysis failed.
    #[error("Pacing error: {0}")]
    Timing(#[from] TimingError),

    /// Caption layout failed.
    #[error("Caption error: {0}")]
    Caption(#[from] CaptionError),

    /// Render graph construction failed.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Generic stage error with message.
    #[error("{0}")]
    Other(String),
}

impl StageError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Wrap a non-zero exit from an external tool.
    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// Tag an I/O error with the operation that attempted it.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Report a malformed artifact or tool payload.
    pub fn parse_error(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            what: what.into(),
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Result alias used inside stage implementations.
pub type StageResult<T> = Result<T, StageError>;

/// Result alias returned by controller entry points.
pub type PipelineResult<T> = Result<T, PipelineError>;

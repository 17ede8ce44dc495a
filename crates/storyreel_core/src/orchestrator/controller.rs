//! Stage controller that executes the pipeline in sequence.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::models::{PipelineRun, StageStatus};

use super::errors::{PipelineError, PipelineResult};
use super::stage::PipelineStage;
use super::store::RunStore;
use super::types::{Context, RunState, StageOutcome};

/// Controller that runs a sequence of pipeline stages.
///
/// Stages execute in order, with validation before and after each one.
/// The controller persists the run record after every status transition,
/// so a crashed or cancelled run resumes from the first stage whose work
/// is missing. Completed stages whose artifacts survive on disk are
/// skipped and their outputs hydrated into state instead.
pub struct StageController {
    /// Stages to execute in order.
    stages: Vec<Box<dyn PipelineStage>>,
    /// Set when any handle requests cancellation.
    cancelled: Arc<AtomicBool>,
}

impl StageController {
    /// Create a new empty controller.
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add a stage to the controller.
    pub fn add_stage<S: PipelineStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Add a stage (builder pattern).
    pub fn with_stage<S: PipelineStage + 'static>(mut self, stage: S) -> Self {
        self.add_stage(stage);
        self
    }

    /// Hand out a handle that can stop the pipeline at the next
    /// stage boundary.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancelled),
        }
    }

    /// Check if the run has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Run the pipeline with the given context and store.
    ///
    /// For each stage in order:
    /// 1. Bail out if a cancel was requested
    /// 2. Skip the stage when the persisted run records it Done and all
    ///    its artifacts still exist (hydrating state via `load_output`)
    /// 3. Run `validate_input`
    /// 4. Mark the stage Running and persist
    /// 5. Run `execute`
    /// 6. Run `validate_output` (if execute returned Success)
    /// 7. Record artifacts, mark the stage Done, and persist
    ///
    /// Returns the final run record on success, or a `PipelineError`
    /// carrying the failed stage. Failures are persisted before returning
    /// so a resumed run retries from the failed stage.
    pub fn run(
        &self,
        ctx: &Context,
        state: &mut RunState,
        store: &RunStore,
    ) -> PipelineResult<PipelineRun> {
        ensure_run_dirs(ctx).map_err(|e| {
            PipelineError::setup_failed(
                &ctx.run_id,
                format!("Failed to create run directories: {}", e),
            )
        })?;

        let mut run = store.load_or_new(&ctx.run_id);
        let total_stages = self.stages.len();

        for (i, stage) in self.stages.iter().enumerate() {
            let stage_id = stage.stage();
            let stage_name = stage_id.name();

            // Cancel lands between stages; the persisted run stays resumable
            if self.is_cancelled() {
                ctx.logger
                    .warn(&format!("Run cancelled before stage '{}'", stage_name));
                self.persist(ctx, store, &run)?;
                return Err(PipelineError::cancelled(&ctx.run_id));
            }

            // Skip completed stages whose artifacts survive on disk
            if run.is_done(stage_id) && artifacts_exist(stage.as_ref(), &run) {
                ctx.logger.info(&format!(
                    "{} already done, loading recorded artifacts",
                    stage_name
                ));
                if let Err(e) = stage.load_output(ctx, &run, state) {
                    ctx.logger
                        .error(&format!("Failed to load artifacts: {}", e));
                    return Err(PipelineError::stage_failed(&ctx.run_id, stage_id, e));
                }
                continue;
            }

            ctx.logger.phase(stage_name);

            let percent = ((i as f64 / total_stages as f64) * 100.0) as u32;
            ctx.report_progress(stage_name, percent, &format!("Starting {}", stage_name));

            ctx.logger
                .debug(&format!("Validating input for '{}'", stage_name));
            if let Err(e) = stage.validate_input(ctx, state) {
                ctx.logger.error(&format!("Input validation failed: {}", e));
                run.mark_failed(stage_id, e.to_string());
                self.persist(ctx, store, &run)?;
                return Err(PipelineError::stage_failed(&ctx.run_id, stage_id, e));
            }

            run.set_status(stage_id, StageStatus::Running);
            self.persist(ctx, store, &run)?;

            ctx.logger.debug(&format!("Executing '{}'", stage_name));
            let outcome = match stage.execute(ctx, state) {
                Ok(outcome) => outcome,
                Err(e) => {
                    ctx.logger.error(&format!("Execution failed: {}", e));
                    run.mark_failed(stage_id, e.to_string());
                    self.persist(ctx, store, &run)?;
                    return Err(PipelineError::stage_failed(&ctx.run_id, stage_id, e));
                }
            };

            match outcome {
                StageOutcome::Success => {
                    ctx.logger
                        .debug(&format!("Validating output for '{}'", stage_name));
                    if let Err(e) = stage.validate_output(ctx, state) {
                        ctx.logger
                            .error(&format!("Output validation failed: {}", e));
                        run.mark_failed(stage_id, e.to_string());
                        self.persist(ctx, store, &run)?;
                        return Err(PipelineError::stage_failed(&ctx.run_id, stage_id, e));
                    }

                    for key in stage.artifact_keys() {
                        run.record_asset(*key, ctx.artifact_path(key));
                    }
                    run.set_status(stage_id, StageStatus::Done);
                    run.last_error = None;
                    self.persist(ctx, store, &run)?;

                    ctx.logger.success(&format!("{} completed", stage_name));
                }
                StageOutcome::Skipped(reason) => {
                    ctx.logger
                        .info(&format!("{} skipped: {}", stage_name, reason));
                    run.set_status(stage_id, StageStatus::Done);
                    self.persist(ctx, store, &run)?;
                }
            }
        }

        ctx.report_progress("Complete", 100, "Run finished");
        ctx.logger.success("Run completed successfully");

        Ok(run)
    }

    /// Get the number of stages in the controller.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Get stage names in order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.stage().name()).collect()
    }

    fn persist(&self, ctx: &Context, store: &RunStore, run: &PipelineRun) -> PipelineResult<()> {
        store.save(run).map_err(|e| {
            PipelineError::setup_failed(&ctx.run_id, format!("Failed to persist run state: {}", e))
        })
    }
}

impl Default for StageController {
    fn default() -> Self {
        Self::new()
    }
}

/// Clonable handle that asks a running pipeline to stop.
#[derive(Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Cancel the run.
    ///
    /// The controller stops at the next stage boundary; the persisted
    /// run record stays resumable.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether a cancel has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

fn ensure_run_dirs(ctx: &Context) -> std::io::Result<()> {
    fs::create_dir_all(&ctx.run_dir)?;
    fs::create_dir_all(ctx.images_dir())?;
    fs::create_dir_all(ctx.audio_dir())?;
    fs::create_dir_all(ctx.temp_dir())?;
    Ok(())
}

fn artifacts_exist(stage: &dyn PipelineStage, run: &PipelineRun) -> bool {
    stage
        .artifact_keys()
        .iter()
        .all(|key| run.asset(key).map(|p| p.exists()).unwrap_or(false))
}

//! Pipeline stage trait definition.
//!
//! All pipeline stages implement this trait, providing a consistent
//! interface for validation, execution, and resume hydration.

use crate::models::PipelineRun;

use super::errors::StageResult;
use super::types::{Context, RunState, StageOutcome};

/// Trait for pipeline stages.
///
/// The controller calls these methods in order for each stage:
///
/// 1. `validate_input` - check preconditions against the accumulated state
/// 2. `execute` - perform the stage's work through the collaborators
/// 3. `validate_output` - verify the stage produced valid output
///
/// When a persisted run already records the stage as done and its
/// artifacts survive on disk, the controller calls `load_output` instead,
/// hydrating [`RunState`] without touching any collaborator.
///
/// # Example
///
/// ```ignore
/// struct AnalysisStage;
///
/// impl PipelineStage for AnalysisStage {
///     fn stage(&self) -> Stage { Stage::Analysis }
///
///     fn validate_input(&self, _ctx: &Context, state: &RunState) -> StageResult<()> {
///         if !state.has_narration() {
///             return Err(StageError::invalid_input("No narration to analyze"));
///         }
///         Ok(())
///     }
///
///     fn execute(&self, ctx: &Context, state: &mut RunState) -> StageResult<StageOutcome> {
///         // Transcribe, build chunks...
///         Ok(StageOutcome::Success)
///     }
///
///     // ...
/// }
/// ```
pub trait PipelineStage: Send + Sync {
    /// Which pipeline stage this implements.
    fn stage(&self) -> crate::models::Stage;

    /// Validate preconditions before execution.
    ///
    /// Runs before `execute`. Checks that required state slots are filled
    /// and required inputs exist.
    fn validate_input(&self, ctx: &Context, state: &RunState) -> StageResult<()>;

    /// Execute the stage's main work.
    ///
    /// Performs the stage's processing and records results in `state`.
    /// Use `ctx.logger` for logging and `ctx.report_progress()` for
    /// progress.
    fn execute(&self, ctx: &Context, state: &mut RunState) -> StageResult<StageOutcome>;

    /// Check what `execute` produced before the stage is marked done.
    ///
    /// Runs only after `execute` returns `Success`. Verifies files exist
    /// and state slots are populated.
    fn validate_output(&self, ctx: &Context, state: &RunState) -> StageResult<()>;

    /// Artifact keys this stage records in the persisted run.
    ///
    /// The controller records one path per key after a successful run of
    /// the stage, and skips the stage on resume only when every key's
    /// file still exists.
    fn artifact_keys(&self) -> &'static [&'static str];

    /// Hydrate state from persisted artifacts when the stage is skipped.
    ///
    /// Called instead of `execute` on resume. Must fill the same state
    /// slots `execute` would, reading from the paths recorded in `run`.
    fn load_output(&self, ctx: &Context, run: &PipelineRun, state: &mut RunState)
        -> StageResult<()>;

    /// Human-readable description of what this stage does.
    fn description(&self) -> &str {
        self.stage().name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Stage;

    struct NoopStage;

    impl PipelineStage for NoopStage {
        fn stage(&self) -> Stage {
            Stage::Script
        }

        fn validate_input(&self, _ctx: &Context, _state: &RunState) -> StageResult<()> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut RunState) -> StageResult<StageOutcome> {
            Ok(StageOutcome::Success)
        }

        fn validate_output(&self, _ctx: &Context, _state: &RunState) -> StageResult<()> {
            Ok(())
        }

        fn artifact_keys(&self) -> &'static [&'static str] {
            &["script"]
        }

        fn load_output(
            &self,
            _ctx: &Context,
            _run: &PipelineRun,
            _state: &mut RunState,
        ) -> StageResult<()> {
            Ok(())
        }
    }

    #[test]
    fn stage_trait_object_works() {
        let stage: Box<dyn PipelineStage> = Box::new(NoopStage);
        assert_eq!(stage.stage(), Stage::Script);
        assert_eq!(stage.description(), "script");
        assert_eq!(stage.artifact_keys(), &["script"]);
    }
}

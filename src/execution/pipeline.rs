//! Migration Pipeline
//!
//! Runs planned steps strictly in order against one evolving buffer. Each
//! step consumes the buffer produced by the one before it, so a later
//! anchor may exist only because an earlier step introduced it. Skipped
//! steps never halt the sequence.
//!
//! The pipeline does no I/O; see [`Engine`](super::Engine) for load and
//! persist.

use log::info;

use crate::error::MigrateError;
use crate::migration::{prepare_plan, MigrationPlan, MigrationStep, PlannedStep};
use crate::report::PipelineRun;

use super::step::apply_step;

/// An ordered, compiled list of migration steps.
///
/// # Example
///
/// ```
/// use docmigrate::anchor::AnchorSpec;
/// use docmigrate::execution::Pipeline;
/// use docmigrate::migration::MigrationStep;
///
/// let pipeline = Pipeline::new(vec![MigrationStep::new(
///     "add-b",
///     AnchorSpec::literal("STEP_A_MARK").with_not_followed_by("\nSTEP_B_MARK"),
///     "STEP_A_MARK\nSTEP_B_MARK",
/// )])
/// .unwrap();
///
/// let run = pipeline.execute("start\nSTEP_A_MARK\nend".to_string());
/// assert_eq!(run.final_content, "start\nSTEP_A_MARK\nSTEP_B_MARK\nend");
/// assert_eq!(run.applied_steps(), vec!["add-b"]);
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<PlannedStep>,
}

impl Pipeline {
    /// Validates the plan and compiles every anchor.
    pub fn from_plan(plan: &MigrationPlan) -> Result<Self, MigrateError> {
        Ok(Self {
            steps: prepare_plan(plan)?,
        })
    }

    /// Builds a pipeline directly from steps.
    pub fn new(steps: Vec<MigrationStep>) -> Result<Self, MigrateError> {
        Self::from_plan(&MigrationPlan::from_steps(steps))
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[PlannedStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Feeds `content` through every step and returns the completed run.
    pub fn execute(&self, content: String) -> PipelineRun {
        let original = content.clone();
        let mut run = PipelineRun::new();
        let mut buffer = content;

        for planned in &self.steps {
            info!(
                "[{}/{}] Running step: {}",
                planned.position + 1,
                self.steps.len(),
                planned.id()
            );

            let (next, outcome) = apply_step(planned, buffer, &run.outcomes);
            buffer = next;
            run.record(outcome);
        }

        run.changed = buffer != original;
        run.final_content = buffer;

        info!(
            "Pipeline finished: {} applied, {} skipped",
            run.applied_count(),
            run.skipped_count()
        );

        run
    }
}

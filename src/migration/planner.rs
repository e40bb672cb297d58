//! Migration Planner
//!
//! Turns a validated plan into the ordered list of executable steps, each
//! paired with its compiled anchor. Every anchor is compiled here, so a
//! malformed one aborts the run before the document is read.

use log::{debug, info};

use super::model::{MigrationPlan, MigrationStep};
use super::validator::{execution_order, validate_plan};
use crate::anchor::AnchorPattern;
use crate::error::MigrateError;

/// A step ready to run: configuration plus compiled anchor.
#[derive(Debug, Clone)]
pub struct PlannedStep {
    /// Zero-based position in the execution order
    pub position: usize,
    pub step: MigrationStep,
    pub pattern: AnchorPattern,
}

impl PlannedStep {
    pub fn id(&self) -> &str {
        &self.step.id
    }
}

/// Validates the plan and compiles every anchor, in execution order.
pub fn prepare_plan(plan: &MigrationPlan) -> Result<Vec<PlannedStep>, MigrateError> {
    validate_plan(plan)?;

    let planned = execution_order(plan)
        .into_iter()
        .enumerate()
        .map(|(position, index)| {
            let step = plan.steps[index].clone();
            let pattern = AnchorPattern::compile(&step.anchor)
                .map_err(|e| MigrateError::configuration(&step.id, e.to_string()))?;

            debug!(
                "Step {} '{}': {} fence(s), expects {} match(es)",
                position + 1,
                step.id,
                pattern.fences().len(),
                step.expected_matches
            );

            Ok(PlannedStep {
                position,
                step,
                pattern,
            })
        })
        .collect::<Result<Vec<_>, MigrateError>>()?;

    info!(
        "Prepared {} steps: {:?}",
        planned.len(),
        planned.iter().map(PlannedStep::id).collect::<Vec<_>>()
    );

    Ok(planned)
}

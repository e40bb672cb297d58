//! Plan Validation
//!
//! Structural checks run before any document is loaded:
//! - Step field validation (IDs, expected match counts, markers)
//! - Unique IDs and explicit orders
//! - Requirement references point at steps that run earlier
//!
//! Anchor compilation happens in the planner; both failures surface as
//! [`MigrateError::Configuration`].

use std::collections::{HashMap, HashSet};

use log::{debug, error, info};
use thiserror::Error;

use super::model::{MigrationPlan, MigrationStep};
use crate::error::MigrateError;

/// Validation error types for user-friendly error messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("plan has no steps")]
    EmptyPlan,
    #[error("step at position {0} has an empty or whitespace-only ID")]
    EmptyStepId(usize),
    #[error("duplicate step ID '{0}'")]
    DuplicateStepId(String),
    #[error("step '{step}' reuses order {order} already taken by '{other}'")]
    DuplicateOrder {
        step: String,
        order: u32,
        other: String,
    },
    #[error("step '{0}' must expect at least one match")]
    ZeroExpectedMatches(String),
    #[error("step '{step}' requires unknown step '{reference}'")]
    UnknownRequirement { step: String, reference: String },
    #[error("step '{step}' requires '{reference}', which does not run before it")]
    RequirementNotEarlier { step: String, reference: String },
    #[error("step '{step}' requires '{reference}', which has no applied_marker")]
    RequirementWithoutMarker { step: String, reference: String },
    #[error("step '{0}' has an empty applied_marker")]
    EmptyMarker(String),
    #[error("step '{0}' has an unresolved replacement_file")]
    UnresolvedReplacementFile(String),
}

impl ValidationError {
    /// Identifier of the offending step, for error reporting.
    pub fn step(&self) -> String {
        match self {
            Self::EmptyPlan => "<plan>".to_string(),
            Self::EmptyStepId(position) => format!("#{}", position),
            Self::DuplicateStepId(step)
            | Self::ZeroExpectedMatches(step)
            | Self::EmptyMarker(step)
            | Self::UnresolvedReplacementFile(step) => step.clone(),
            Self::DuplicateOrder { step, .. }
            | Self::UnknownRequirement { step, .. }
            | Self::RequirementNotEarlier { step, .. }
            | Self::RequirementWithoutMarker { step, .. } => step.clone(),
        }
    }
}

impl From<ValidationError> for MigrateError {
    fn from(err: ValidationError) -> Self {
        MigrateError::Configuration {
            step: err.step(),
            reason: err.to_string(),
        }
    }
}

/// Validates a single step's fields.
fn validate_step(position: usize, step: &MigrationStep) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if step.id.trim().is_empty() {
        errors.push(ValidationError::EmptyStepId(position));
        return errors; // Can't validate further without ID
    }

    if step.expected_matches == 0 {
        errors.push(ValidationError::ZeroExpectedMatches(step.id.clone()));
    }

    if step.applied_marker.as_deref() == Some("") {
        errors.push(ValidationError::EmptyMarker(step.id.clone()));
    }

    if step.replacement_file.is_some() {
        errors.push(ValidationError::UnresolvedReplacementFile(step.id.clone()));
    }

    if step.replacement.is_empty() {
        debug!("Step '{}' deletes its matched region", step.id);
    }

    errors
}

/// Returns step indices in execution order.
///
/// Steps sort by `order`. A step without one takes the order of the
/// nearest ordered step declared before it (0 if there is none), so it
/// runs right after that step. Ties keep declaration order.
pub fn execution_order(plan: &MigrationPlan) -> Vec<usize> {
    let mut inherited = 0;
    let mut keyed: Vec<(u32, usize)> = plan
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            if let Some(order) = step.order {
                inherited = order;
            }
            (inherited, index)
        })
        .collect();
    keyed.sort();
    keyed.into_iter().map(|(_, index)| index).collect()
}

/// Collects every structural problem in the plan.
pub fn check_plan(plan: &MigrationPlan) -> Vec<ValidationError> {
    if plan.steps.is_empty() {
        return vec![ValidationError::EmptyPlan];
    }

    let mut errors = Vec::new();

    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut seen_orders: HashMap<u32, &str> = HashMap::new();
    for (position, step) in plan.steps.iter().enumerate() {
        errors.extend(validate_step(position, step));

        if !step.id.trim().is_empty() && !seen_ids.insert(step.id.as_str()) {
            errors.push(ValidationError::DuplicateStepId(step.id.clone()));
        }

        if let Some(order) = step.order {
            if let Some(other) = seen_orders.insert(order, step.id.as_str()) {
                errors.push(ValidationError::DuplicateOrder {
                    step: step.id.clone(),
                    order,
                    other: other.to_string(),
                });
            }
        }
    }

    let with_marker: HashSet<&str> = plan
        .steps
        .iter()
        .filter(|s| s.applied_marker.is_some())
        .map(|s| s.id.as_str())
        .collect();

    // Requirements must refer to steps that have already run
    let mut earlier: HashSet<&str> = HashSet::new();
    for index in execution_order(plan) {
        let step = &plan.steps[index];
        for reference in &step.requires {
            if !seen_ids.contains(reference.as_str()) {
                errors.push(ValidationError::UnknownRequirement {
                    step: step.id.clone(),
                    reference: reference.clone(),
                });
            } else if !earlier.contains(reference.as_str()) {
                errors.push(ValidationError::RequirementNotEarlier {
                    step: step.id.clone(),
                    reference: reference.clone(),
                });
            } else if !with_marker.contains(reference.as_str()) {
                // Without a marker a persisted edit reads as "not found"
                errors.push(ValidationError::RequirementWithoutMarker {
                    step: step.id.clone(),
                    reference: reference.clone(),
                });
            }
        }
        earlier.insert(step.id.as_str());
    }

    errors
}

/// Validates the plan, failing on the first structural problem.
///
/// Every problem found is logged before returning.
pub fn validate_plan(plan: &MigrationPlan) -> Result<(), MigrateError> {
    info!("Validating plan with {} steps", plan.steps.len());

    let errors = check_plan(plan);
    for err in &errors {
        error!("Invalid plan: {}", err);
    }

    match errors.into_iter().next() {
        Some(first) => Err(first.into()),
        None => Ok(()),
    }
}

//! Individual Step Execution
//!
//! Applies one planned step to a buffer. A step is a pure function from
//! the incoming buffer to the outgoing buffer plus an outcome record:
//! - Anchor matching and the applied-marker check
//! - Requirement check against earlier outcomes
//! - The match-count precondition
//! - Literal substitution of the matched span(s)
//!
//! A precondition that does not hold is never an error. The buffer passes
//! through untouched and the outcome records why.

use log::debug;

use crate::anchor::Match;
use crate::migration::{PlannedStep, ReplaceMode};
use crate::report::{SkipReason, StepOutcome};

/// Applies a single step.
///
/// # Arguments
///
/// * `planned` - The step and its compiled anchor
/// * `buffer` - Document text produced by the previous step
/// * `prior` - Outcomes of the steps that already ran in this pipeline
///
/// # Returns
///
/// The next buffer and the step's outcome. When the step is skipped the
/// returned buffer is `buffer` itself.
pub fn apply_step(
    planned: &PlannedStep,
    buffer: String,
    prior: &[StepOutcome],
) -> (String, StepOutcome) {
    let step = &planned.step;

    let matches = planned.pattern.find_all(&buffer);
    let found = matches.len();
    debug!(
        "Step '{}': {} match(es), {} expected",
        step.id, found, step.expected_matches
    );

    // An edit already present in the buffer wins over every other reason
    if found != step.expected_matches && marker_present(planned, &buffer) {
        let outcome = StepOutcome::skipped(&step.id, found, SkipReason::AlreadyApplied);
        return (buffer, outcome);
    }

    if let Some(unmet) = unmet_requirement(planned, prior) {
        let outcome = StepOutcome::skipped(
            &step.id,
            found,
            SkipReason::RequirementNotMet {
                step: unmet.to_string(),
            },
        );
        return (buffer, outcome);
    }

    if found != step.expected_matches {
        let reason = if found > 0 {
            SkipReason::MatchCountMismatch {
                expected: step.expected_matches,
                found,
            }
        } else {
            SkipReason::AnchorNotFound
        };
        return (buffer, StepOutcome::skipped(&step.id, found, reason));
    }

    let targets = match step.replace {
        ReplaceMode::First => &matches[..1],
        ReplaceMode::All => &matches[..],
    };
    let updated = substitute(&buffer, targets, &step.replacement);

    (updated, StepOutcome::applied(&step.id, found))
}

fn marker_present(planned: &PlannedStep, buffer: &str) -> bool {
    planned
        .step
        .applied_marker
        .as_deref()
        .is_some_and(|marker| buffer.contains(marker))
}

/// First required step whose edit is not present in the buffer.
fn unmet_requirement<'a>(planned: &'a PlannedStep, prior: &[StepOutcome]) -> Option<&'a str> {
    planned
        .step
        .requires
        .iter()
        .find(|required| {
            !prior
                .iter()
                .any(|o| &o.step_id == *required && o.is_satisfied())
        })
        .map(String::as_str)
}

/// Replaces each target span with `replacement`, verbatim.
///
/// `targets` must be ordered and non-overlapping, as produced by
/// [`AnchorPattern::find_all`](crate::anchor::AnchorPattern::find_all).
fn substitute(buffer: &str, targets: &[Match], replacement: &str) -> String {
    let removed: usize = targets.iter().map(Match::len).sum();
    let mut output =
        String::with_capacity(buffer.len() - removed + replacement.len() * targets.len());

    let mut last = 0;
    for target in targets {
        output.push_str(&buffer[last..target.start]);
        output.push_str(replacement);
        last = target.end;
    }
    output.push_str(&buffer[last..]);

    output
}

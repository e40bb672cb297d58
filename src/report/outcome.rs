//! Step Outcomes
//!
//! Each step produces exactly one terminal outcome per run:
//! `PENDING -> APPLIED` or `PENDING -> SKIPPED`. Outcomes are never revised.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal state of a step.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Precondition held and the buffer was rewritten
    Applied,
    /// Precondition did not hold; buffer left untouched
    Skipped,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => write!(f, "APPLIED"),
            Self::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Why a step did not apply.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// No match, and the step's applied marker is present
    AlreadyApplied,
    /// No match and no evidence of an earlier application
    AnchorNotFound,
    /// Some matches, but not the expected number
    MatchCountMismatch { expected: usize, found: usize },
    /// A required step neither applied nor was already applied
    RequirementNotMet { step: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyApplied => write!(f, "already applied"),
            Self::AnchorNotFound => write!(f, "anchor not found"),
            Self::MatchCountMismatch { expected, found } => {
                write!(f, "expected {} match(es), found {}", expected, found)
            }
            Self::RequirementNotMet { step } => {
                write!(f, "required step '{}' did not apply", step)
            }
        }
    }
}

/// Result of running one step against the buffer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// ID of the step
    pub step_id: String,
    /// Terminal state; always agrees with `applied`
    pub status: StepStatus,
    /// Number of non-overlapping anchor matches found
    pub match_count: usize,
    /// Whether the buffer was rewritten
    pub applied: bool,
    /// Present exactly when `applied` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
}

impl StepOutcome {
    pub fn applied(step_id: impl Into<String>, match_count: usize) -> Self {
        Self {
            step_id: step_id.into(),
            status: StepStatus::Applied,
            match_count,
            applied: true,
            skip_reason: None,
        }
    }

    pub fn skipped(step_id: impl Into<String>, match_count: usize, reason: SkipReason) -> Self {
        Self {
            step_id: step_id.into(),
            status: StepStatus::Skipped,
            match_count,
            applied: false,
            skip_reason: Some(reason),
        }
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }

    /// Skip reason if skipped, otherwise the match count.
    pub fn detail(&self) -> String {
        match &self.skip_reason {
            Some(reason) => reason.to_string(),
            None => format!("{} match(es)", self.match_count),
        }
    }

    /// True if this step's edit is present in the buffer, whether it was
    /// made in this run or an earlier one.
    pub fn is_satisfied(&self) -> bool {
        self.applied || self.skip_reason == Some(SkipReason::AlreadyApplied)
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.status, self.step_id, self.detail())
    }
}

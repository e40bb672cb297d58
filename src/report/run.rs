//! Pipeline Run Report
//!
//! Accumulates step outcomes for one run and renders them as a text
//! summary or a JSON document.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

use super::outcome::{SkipReason, StepOutcome};

/// Everything recorded about one execution of a pipeline.
#[derive(Serialize, Debug, Clone)]
pub struct PipelineRun {
    /// Document the run targeted, if it came from disk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<PathBuf>,
    /// Persisting was skipped on purpose
    pub dry_run: bool,
    /// When the pipeline started
    pub started_at: DateTime<Utc>,
    /// One outcome per step, in execution order
    pub outcomes: Vec<StepOutcome>,
    /// Buffer after the last step
    #[serde(skip)]
    pub final_content: String,
    /// Final buffer differs from the loaded one
    pub changed: bool,
    /// Final buffer was written back
    pub persisted: bool,
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineRun {
    /// Starts an empty run stamped with the current time.
    pub fn new() -> Self {
        Self {
            document: None,
            dry_run: false,
            started_at: Utc::now(),
            outcomes: Vec::new(),
            final_content: String::new(),
            changed: false,
            persisted: false,
        }
    }

    /// Appends a step's outcome and logs it.
    pub fn record(&mut self, outcome: StepOutcome) {
        match &outcome.skip_reason {
            None => info!("Step '{}' applied", outcome.step_id),
            Some(reason @ SkipReason::MatchCountMismatch { .. }) => {
                warn!("Step '{}' skipped: {}", outcome.step_id, reason)
            }
            Some(reason) => info!("Step '{}' skipped: {}", outcome.step_id, reason),
        }
        self.outcomes.push(outcome);
    }

    /// Returns the outcome for a step ID.
    pub fn outcome(&self, step_id: &str) -> Option<&StepOutcome> {
        self.outcomes.iter().find(|o| o.step_id == step_id)
    }

    /// IDs of steps that rewrote the buffer.
    pub fn applied_steps(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.applied)
            .map(|o| o.step_id.as_str())
            .collect()
    }

    /// IDs of steps that left the buffer untouched.
    pub fn skipped_steps(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.applied)
            .map(|o| o.step_id.as_str())
            .collect()
    }

    pub fn applied_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.applied).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.applied_count()
    }

    /// Totals line, e.g. `3 applied, 1 skipped`.
    pub fn totals(&self) -> String {
        format!(
            "{} applied, {} skipped",
            self.applied_count(),
            self.skipped_count()
        )
    }

    /// What happened to the document, if anything worth saying.
    pub fn write_note(&self) -> Option<&'static str> {
        if self.dry_run {
            Some("(dry run, document not written)")
        } else if self.persisted {
            Some("(document written)")
        } else {
            None
        }
    }

    /// Renders a plain-text summary: one line per step, then totals.
    pub fn summary(&self) -> String {
        let mut output = String::from("Migration Summary:\n\n");

        for (position, outcome) in self.outcomes.iter().enumerate() {
            output.push_str(&format!("  {:>2}. {}\n", position + 1, outcome));
        }

        output.push('\n');
        output.push_str(&self.totals());
        if let Some(note) = self.write_note() {
            output.push(' ');
            output.push_str(note);
        }
        output.push('\n');

        output
    }

    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

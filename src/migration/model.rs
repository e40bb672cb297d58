//! Migration Data Model
//!
//! Core data structures describing migration steps and the plan that
//! orders them.
//!
//! # Example YAML Format
//!
//! ```yaml
//! name: workflow-refactor
//! document: src/routes/repoMigrationRoutes.ts
//! steps:
//!   - id: defer-service-generation
//!     order: 1
//!     anchor:
//!       fences:
//!         - "const serviceGenerator = new SpringBootServiceGenerator();"
//!         - "microservices locally.`;"
//!     replacement: "serviceGenRawOutput = `Service specifications prepared.`;"
//!     applied_marker: "Service specifications prepared."
//!
//!   - id: generate-after-validation
//!     order: 2
//!     anchor:
//!       fences: "logger.info('E2E complete');"
//!       not_followed_by: "\n    // CODE GENERATION"
//!     replacement_file: snippets/code-generation.ts
//!     requires:
//!       - defer-service-generation
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::anchor::AnchorSpec;

/// Which matched spans receive the replacement once a step applies.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReplaceMode {
    /// Replace the leftmost match only
    #[default]
    First,
    /// Replace every match
    All,
}

/// A single named, anchor-based edit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MigrationStep {
    /// Unique identifier for this step
    pub id: String,

    /// Execution position; declaration order is used when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,

    /// Free-form description shown in reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Region of the document this step replaces
    pub anchor: AnchorSpec,

    /// Literal text substituted for the matched region
    #[serde(default)]
    pub replacement: String,

    /// File holding the replacement, relative to the plan file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_file: Option<PathBuf>,

    /// Number of matches required for the step to apply
    #[serde(default = "default_expected_matches")]
    pub expected_matches: usize,

    /// Which matches are replaced
    #[serde(default)]
    pub replace: ReplaceMode,

    /// Steps that must have applied (now or in an earlier run) first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,

    /// Literal text whose presence shows this step already ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_marker: Option<String>,
}

fn default_expected_matches() -> usize {
    1
}

impl MigrationStep {
    /// Creates a step that replaces exactly one occurrence of `anchor`.
    ///
    /// # Example
    ///
    /// ```
    /// use docmigrate::anchor::AnchorSpec;
    /// use docmigrate::migration::MigrationStep;
    ///
    /// let step = MigrationStep::new(
    ///     "add-step-b",
    ///     AnchorSpec::literal("STEP_A_MARK").with_not_followed_by("\nSTEP_B_MARK"),
    ///     "STEP_A_MARK\nSTEP_B_MARK",
    /// )
    /// .with_order(1);
    /// assert_eq!(step.expected_matches, 1);
    /// ```
    pub fn new(id: impl Into<String>, anchor: AnchorSpec, replacement: impl Into<String>) -> Self {
        Self {
            id: id.into().trim().to_string(),
            order: None,
            description: None,
            anchor,
            replacement: replacement.into(),
            replacement_file: None,
            expected_matches: default_expected_matches(),
            replace: ReplaceMode::First,
            requires: Vec::new(),
            applied_marker: None,
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_expected_matches(mut self, expected: usize) -> Self {
        self.expected_matches = expected;
        self
    }

    pub fn with_replace(mut self, mode: ReplaceMode) -> Self {
        self.replace = mode;
        self
    }

    pub fn with_applied_marker(mut self, marker: impl Into<String>) -> Self {
        self.applied_marker = Some(marker.into());
        self
    }

    /// Adds a requirement on an earlier step.
    pub fn requires(mut self, step_id: impl Into<String>) -> Self {
        self.requires.push(step_id.into());
        self
    }
}

/// An ordered set of migration steps aimed at one document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct MigrationPlan {
    /// Human-readable plan name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Default document path when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<PathBuf>,

    /// Steps in declaration order
    #[serde(default)]
    pub steps: Vec<MigrationStep>,
}

impl MigrationPlan {
    /// Creates a new empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a plan from a list of steps.
    pub fn from_steps(steps: Vec<MigrationStep>) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    /// Adds a step to the plan.
    pub fn add_step(&mut self, step: MigrationStep) -> Result<(), String> {
        if self.steps.iter().any(|s| s.id == step.id) {
            return Err(format!("Step '{}' already exists", step.id));
        }
        self.steps.push(step);
        Ok(())
    }

    /// Gets a step by ID.
    pub fn get_step(&self, id: &str) -> Option<&MigrationStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Returns the number of steps in the plan.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the plan has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

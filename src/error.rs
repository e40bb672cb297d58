//! Error Types
//!
//! Fatal conditions that abort a migration run. A step whose anchor does
//! not match is *not* an error; it is recorded as a skipped outcome in the
//! run report.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::report::PipelineRun;

/// Exit code for document load or persist failures.
pub const EXIT_DOCUMENT: u8 = 1;

/// Exit code for plan or anchor configuration failures.
pub const EXIT_CONFIGURATION: u8 = 2;

/// Errors that abort a migration run.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// A step or its anchor is malformed. Raised before the document is loaded.
    #[error("configuration error in step '{step}': {reason}")]
    Configuration { step: String, reason: String },

    /// The plan file could not be read or parsed.
    #[error("failed to load plan '{}': {reason}", path.display())]
    PlanLoad { path: PathBuf, reason: String },

    /// The target document could not be read.
    #[error("failed to load document '{}': {source}", path.display())]
    DocumentLoad {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The migrated buffer could not be written back.
    ///
    /// The completed run is kept so callers can still inspect the buffer
    /// and per-step outcomes.
    #[error("failed to write document '{}': {source}", path.display())]
    DocumentWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
        run: Box<PipelineRun>,
    },
}

impl MigrateError {
    /// Shorthand for a [`MigrateError::Configuration`].
    pub fn configuration(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            step: step.into(),
            reason: reason.into(),
        }
    }

    /// Process exit code the CLI reports for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration { .. } | Self::PlanLoad { .. } => EXIT_CONFIGURATION,
            Self::DocumentLoad { .. } | Self::DocumentWrite { .. } => EXIT_DOCUMENT,
        }
    }

    /// Returns true for errors raised before the document was touched.
    pub fn is_configuration(&self) -> bool {
        self.exit_code() == EXIT_CONFIGURATION
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_exit_code() {
        let err = MigrateError::configuration("step1", "empty fence list");
        assert_eq!(err.exit_code(), EXIT_CONFIGURATION);
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "configuration error in step 'step1': empty fence list"
        );
    }

    #[test]
    fn test_document_load_exit_code() {
        let err = MigrateError::DocumentLoad {
            path: PathBuf::from("missing.ts"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.exit_code(), EXIT_DOCUMENT);
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("missing.ts"));
    }

    #[test]
    fn test_plan_load_is_configuration() {
        let err = MigrateError::PlanLoad {
            path: PathBuf::from("plan.yaml"),
            reason: "bad yaml".to_string(),
        };
        assert_eq!(err.exit_code(), EXIT_CONFIGURATION);
    }
}

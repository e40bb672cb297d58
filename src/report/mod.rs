//! Run Reporting Module
//!
//! Records what each step did during a run, for logging, the CLI summary,
//! and programmatic inspection by callers and tests.
//!
//! # Components
//!
//! - [`StepOutcome`]: terminal applied/skipped record for one step
//! - [`PipelineRun`]: ordered outcomes plus the final buffer

pub mod outcome;
pub mod run;

pub use outcome::{SkipReason, StepOutcome, StepStatus};
pub use run::PipelineRun;

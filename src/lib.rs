//! docmigrate - Anchor-Based Document Migration Engine
//!
//! Applies an ordered list of named, anchor-located edits to a single text
//! document. Each step finds a literal-with-gaps anchor in the current
//! buffer and replaces it; a step whose anchor does not match the expected
//! number of times is skipped, which makes re-running a plan against an
//! already migrated document a safe no-op.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`anchor`]: Structured anchors and the fence-and-gap matcher
//! - [`migration`]: Step and plan definitions, YAML loading, validation
//! - [`execution`]: Step application, pipeline sequencing, run engine
//! - [`document`]: Document loading and atomic persistence
//! - [`report`]: Per-step outcomes and run summaries
//! - [`error`]: Fatal error taxonomy
//!
//! # Example
//!
//! ```rust,no_run
//! use docmigrate::{load_plan, Engine};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load a plan from YAML
//!     let plan = load_plan("migration.yaml")?;
//!
//!     // Bind it to a document; anchors are compiled here
//!     let engine = Engine::from_plan(&plan, "src/routes/repoMigrationRoutes.ts")?;
//!
//!     // Run and report
//!     let run = engine.run()?;
//!     println!("{}", run.summary());
//!     Ok(())
//! }
//! ```

pub mod anchor;
pub mod document;
pub mod error;
pub mod execution;
pub mod migration;
pub mod report;

// Re-export commonly used types
pub use anchor::{AnchorPattern, AnchorSpec, GapSpec};
pub use error::MigrateError;
pub use execution::{Engine, Pipeline};
pub use migration::{load_plan, MigrationPlan, MigrationStep};
pub use report::{PipelineRun, SkipReason, StepOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "docmigrate";

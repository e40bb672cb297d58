//! Migration Definition Module
//!
//! Provides data structures and utilities for defining, parsing and
//! validating migration plans.
//!
//! # Structure
//!
//! - [`model`]: Core data structures (MigrationStep, MigrationPlan)
//! - [`parser`]: YAML parsing and loading
//! - [`validator`]: Structural checks and execution ordering
//! - [`planner`]: Anchor compilation into executable steps

pub mod model;
pub mod parser;
pub mod planner;
pub mod validator;

pub use model::{MigrationPlan, MigrationStep, ReplaceMode};
pub use parser::{load_plan, parse_plan};
pub use planner::{prepare_plan, PlannedStep};
pub use validator::{validate_plan, ValidationError};

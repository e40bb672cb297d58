//! Anchor Patterns
//!
//! Structured anchors locate the region of a document a migration step
//! replaces. An anchor is an ordered list of literal fences separated by
//! bounded gaps; it is never an inline regular expression.
//!
//! - [`spec`]: serialized anchor description (fences, gap bounds, guards)
//! - [`pattern`]: compiled matcher

pub mod pattern;
pub mod spec;

pub use pattern::{AnchorPattern, Gap, Match, PatternError};
pub use spec::{AnchorSpec, GapSpec};

//! Document I/O
//!
//! Loading and atomic persistence of the single document a run migrates.

pub mod store;

pub use store::Document;

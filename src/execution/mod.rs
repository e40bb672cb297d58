//! Migration Execution Module
//!
//! Runs migration steps against a document.
//!
//! # Architecture
//!
//! - [`engine`]: Load, execute and persist one document
//! - [`pipeline`]: Ordered, I/O-free step sequencing
//! - [`step`]: Individual step application

pub mod engine;
pub mod pipeline;
pub mod step;

pub use engine::Engine;
pub use pipeline::Pipeline;
pub use step::apply_step;

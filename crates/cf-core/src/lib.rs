//! cf-core: shared types, IDs, errors and configuration for clipforge.
//!
//! This crate is the foundational dependency for the other cf-* crates,
//! providing the unified error type, the per-run identifier used to keep
//! temporary artifacts of concurrent jobs apart, the job request model and
//! application configuration.

pub mod config;
pub mod error;
pub mod ids;
pub mod request;
pub mod stage;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::RunId;
pub use request::{ColorAdjustment, PipelineOptions, PipelineRequest};
pub use stage::StageKind;

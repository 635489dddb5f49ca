//! # cf-pipeline
//!
//! Orchestration of a single clipforge job.
//!
//! This crate provides:
//!
//! - **[`PipelineOrchestrator`]** -- the state machine that normalizes the
//!   source, applies the enabled edit stages, overlays replacement audio and
//!   moves the result into place, releasing every temporary artifact on the
//!   way out.
//! - **Overlay planning** ([`overlay`]) -- [`AudioTrackSelection`] and
//!   [`DurationAlignmentPlan`].
//! - **Edit stages** ([`stages`]) -- the declarative pitch / rotate / colour
//!   chain.
//! - **[`RunContext`]** -- cancellation token and progress callback.

pub mod context;
pub mod orchestrator;
pub mod overlay;
pub mod stages;

// Re-export key types at the crate root.
pub use context::{ProgressEvent, ProgressSender, RunContext};
pub use orchestrator::{
    OrchestratorSettings, PipelineOrchestrator, PipelineOutcome, PipelineState,
};
pub use overlay::{AlignmentStrategy, AudioTrackSelection, DurationAlignmentPlan};
pub use stages::EditStage;

//! # cf-av
//!
//! External engine plumbing for the clipforge pipeline.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- locate ffmpeg and ffprobe and
//!   attach a time budget to each.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   and kill-on-drop for running external processes.
//! - **Probing** ([`MediaProbe`], [`FfprobeProbe`]) -- audio presence and
//!   duration queries.
//! - **Transcode stages** ([`StageSpec`], [`StageRunner`], [`FfmpegRunner`])
//!   -- one engine invocation producing one artifact.
//! - **Paths** ([`ArtifactPathResolver`]) -- absolute resolution and
//!   destination directory creation.
//! - **Artifacts** ([`TempArtifactManager`]) -- per-run temporary files and
//!   their cleanup.

pub mod artifacts;
pub mod command;
pub mod paths;
pub mod probe;
pub mod stage;
pub mod tools;

// ---- Re-exports for convenience ----

pub use artifacts::{ArtifactHandle, ReleaseReport, StageArtifact, TempArtifactManager};
pub use command::{ToolCommand, ToolOutput};
pub use paths::ArtifactPathResolver;
pub use probe::{FfprobeProbe, MediaInfo, MediaProbe, MediaType, StreamInfo};
pub use stage::{Codec, FfmpegRunner, StageInput, StageRunner, StageSpec};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};

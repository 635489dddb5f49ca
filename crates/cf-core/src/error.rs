//! Unified error type for clipforge.
//!
//! All crates funnel their failures into [`Error`]. Failures raised while a
//! pipeline stage is running are wrapped in [`Error::Stage`] so the caller
//! always learns which stage failed and why.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::stage::StageKind;

/// Unified error type covering all failure modes in clipforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required input could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of input (e.g. "source video").
        entity: String,
        /// The path or identifier that was looked up.
        id: String,
    },

    /// Invalid or contradictory options or configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A directory or file operation failed for a reason other than absence.
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        /// The path being operated on.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Media metadata could not be extracted.
    #[error("Probe error [{}]: {message}", path.display())]
    Probe {
        /// The file that was probed.
        path: PathBuf,
        /// Human-readable error description.
        message: String,
    },

    /// The transcoding engine exited unsuccessfully.
    #[error("Transcode error (exit code {}): {stderr_excerpt}", exit_label(.exit_code))]
    Transcode {
        /// Process exit code, `None` when terminated by a signal.
        exit_code: Option<i32>,
        /// Tail of the engine's diagnostic output.
        stderr_excerpt: String,
    },

    /// An external tool is not installed or not on `PATH`.
    #[error("Tool not found: {tool}")]
    ToolNotFound {
        /// Name of the missing tool.
        tool: String,
    },

    /// An external tool could not be spawned or awaited.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// An external tool exited with a non-zero status.
    #[error("Tool error [{tool}]: exited with status {}: {stderr}", exit_label(.exit_code))]
    ToolExit {
        /// Name of the tool that failed.
        tool: String,
        /// Process exit code, `None` when terminated by a signal.
        exit_code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// An external tool exceeded its time budget and was killed.
    #[error("Tool error [{tool}]: timed out after {timeout:?}")]
    Timeout {
        /// Name of the tool that timed out.
        tool: String,
        /// The budget that was exceeded.
        timeout: Duration,
    },

    /// The run was cancelled by the caller.
    #[error("Cancelled")]
    Cancelled,

    /// A pipeline stage failed.
    #[error("Stage {stage} failed: {source}")]
    Stage {
        /// The stage that failed.
        stage: StageKind,
        /// The underlying cause.
        #[source]
        source: Box<Error>,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

impl Error {
    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// Convenience constructor for [`Error::Filesystem`].
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Convenience constructor for [`Error::Probe`].
    pub fn probe(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Probe {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Tag this error with the stage it occurred in.
    ///
    /// Errors that already carry a stage are returned unchanged.
    pub fn in_stage(self, stage: StageKind) -> Self {
        match self {
            Error::Stage { .. } => self,
            other => Error::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The stage this error was raised in, if any.
    pub fn failed_stage(&self) -> Option<StageKind> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The underlying cause with any stage tagging removed.
    pub fn root(&self) -> &Error {
        match self {
            Error::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the run ended because the caller cancelled it.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Error::Cancelled)
    }

    /// Map this error to a process exit status for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self.root() {
            Error::Configuration(_) | Error::NotFound { .. } => 2,
            Error::Cancelled => 130,
            _ => 1,
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn not_found_display() {
        let err = Error::not_found("source video", "/tmp/missing.webm");
        assert_eq!(err.to_string(), "source video not found: /tmp/missing.webm");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn configuration_display() {
        let err = Error::configuration("pitch factor must be > 0");
        assert_eq!(
            err.to_string(),
            "Configuration error: pitch factor must be > 0"
        );
    }

    #[test]
    fn transcode_display_with_and_without_code() {
        let err = Error::Transcode {
            exit_code: Some(1),
            stderr_excerpt: "Invalid argument".into(),
        };
        assert_eq!(
            err.to_string(),
            "Transcode error (exit code 1): Invalid argument"
        );

        let err = Error::Transcode {
            exit_code: None,
            stderr_excerpt: String::new(),
        };
        assert!(err.to_string().contains("exit code signal"));
    }

    #[test]
    fn timeout_display() {
        let err = Error::Timeout {
            tool: "ffmpeg".into(),
            timeout: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "Tool error [ffmpeg]: timed out after 5s");
    }

    #[test]
    fn stage_wrapping() {
        let err = Error::Transcode {
            exit_code: Some(1),
            stderr_excerpt: "boom".into(),
        }
        .in_stage(StageKind::Rotate);

        assert_eq!(err.failed_stage(), Some(StageKind::Rotate));
        assert_matches!(err.root(), Error::Transcode { exit_code: Some(1), .. });
        assert_eq!(
            err.to_string(),
            "Stage rotate failed: Transcode error (exit code 1): boom"
        );
    }

    #[test]
    fn stage_wrapping_is_not_nested() {
        let err = Error::Cancelled
            .in_stage(StageKind::Pitch)
            .in_stage(StageKind::Finalize);
        assert_eq!(err.failed_stage(), Some(StageKind::Pitch));
        assert!(err.is_cancelled());
        assert_eq!(err.exit_code(), 130);
    }

    #[test]
    fn source_chain_exposes_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::filesystem("/out", io);
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "denied");
        assert_eq!(err.exit_code(), 1);
    }
}

//! Temporary artifact bookkeeping for a pipeline run.
//!
//! A [`TempArtifactManager`] hands out per-run-unique paths for intermediate
//! files, remembers every one of them, and deletes them all when the run
//! ends. It is the only component that removes files it tracks.

use std::path::{Path, PathBuf};

use cf_core::{RunId, StageKind};
use serde::Serialize;

/// Prefix shared by every temporary artifact file name.
pub const ARTIFACT_PREFIX: &str = ".clipforge-";

/// An intermediate file produced by one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageArtifact {
    pub path: PathBuf,
    pub produced_by: StageKind,
    /// Temporary artifacts are deleted by [`TempArtifactManager::release_all`].
    pub is_temporary: bool,
}

impl StageArtifact {
    /// A temporary artifact produced by `stage`.
    pub fn temporary(path: impl Into<PathBuf>, stage: StageKind) -> Self {
        Self {
            path: path.into(),
            produced_by: stage,
            is_temporary: true,
        }
    }
}

/// Handle returned when an artifact is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHandle {
    path: PathBuf,
    stage: StageKind,
}

impl ArtifactHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stage(&self) -> StageKind {
        self.stage
    }
}

/// Outcome of a [`TempArtifactManager::release_all`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseReport {
    /// Files that existed and were deleted.
    pub removed: usize,
    /// Tracked paths that no longer existed (never written, or moved away).
    pub missing: usize,
    /// Files that could not be deleted; each failure was logged.
    pub failed: usize,
}

/// Tracks the temporary artifacts of one pipeline run.
///
/// Dropping the manager releases anything still tracked, so artifacts are
/// cleaned up even when the run future is dropped mid-stage.
#[derive(Debug)]
pub struct TempArtifactManager {
    work_dir: PathBuf,
    run_id: RunId,
    artifacts: Vec<StageArtifact>,
    next_seq: u32,
}

impl TempArtifactManager {
    /// Create a manager that places artifacts in `work_dir`.
    pub fn new(work_dir: impl Into<PathBuf>, run_id: RunId) -> Self {
        Self {
            work_dir: work_dir.into(),
            run_id,
            artifacts: Vec::new(),
            next_seq: 0,
        }
    }

    /// Directory holding the artifacts.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Reserve and track a fresh artifact path for `stage`.
    ///
    /// The name embeds the run id and a sequence number:
    /// `.clipforge-<run>-<seq>-<stage>.<extension>`. Nothing is created on
    /// disk; the path is tracked before any tool writes to it so partial
    /// output is always cleaned up.
    pub fn allocate(&mut self, stage: StageKind, extension: &str) -> ArtifactHandle {
        let name = format!(
            "{ARTIFACT_PREFIX}{}-{:02}-{}.{}",
            self.run_id.file_token(),
            self.next_seq,
            stage.as_str(),
            extension.trim_start_matches('.')
        );
        self.next_seq += 1;
        self.track(StageArtifact::temporary(self.work_dir.join(name), stage))
    }

    /// Register an artifact for cleanup.
    pub fn track(&mut self, artifact: StageArtifact) -> ArtifactHandle {
        tracing::trace!(
            "tracking {} ({})",
            artifact.path.display(),
            artifact.produced_by
        );
        let handle = ArtifactHandle {
            path: artifact.path.clone(),
            stage: artifact.produced_by,
        };
        self.artifacts.push(artifact);
        handle
    }

    /// Artifacts registered and not yet released.
    pub fn tracked(&self) -> &[StageArtifact] {
        &self.artifacts
    }

    /// Delete every tracked temporary artifact whose file still exists.
    ///
    /// Absent files are skipped. A failed deletion is logged and does not
    /// stop the remaining deletions. Calling this again is a no-op.
    pub fn release_all(&mut self) -> ReleaseReport {
        let mut report = ReleaseReport::default();

        for artifact in self.artifacts.drain(..) {
            if !artifact.is_temporary {
                continue;
            }
            match std::fs::remove_file(&artifact.path) {
                Ok(()) => {
                    tracing::debug!("Deleted temporary file: {}", artifact.path.display());
                    report.removed += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    report.missing += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to delete temporary file {}: {e}",
                        artifact.path.display()
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }
}

impl Drop for TempArtifactManager {
    fn drop(&mut self) {
        if !self.artifacts.is_empty() {
            let report = self.release_all();
            tracing::debug!("released artifacts on drop: {report:?}");
        }
    }
}

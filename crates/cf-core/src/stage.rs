//! Identifiers for the transformation stages of a pipeline run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A discrete step of the pipeline that produces exactly one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Convert the source into the working container/codec baseline.
    Normalize,
    /// Resample the audio track by the configured pitch factor.
    Pitch,
    /// Rotate the video clockwise.
    Rotate,
    /// Apply brightness/contrast/saturation correction.
    ColorAdjust,
    /// Mux a replacement audio track against the video.
    AudioOverlay,
    /// Move the working artifact to the final output path.
    Finalize,
}

impl StageKind {
    /// Stable lowercase identifier, also used in temporary file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Normalize => "normalize",
            StageKind::Pitch => "pitch",
            StageKind::Rotate => "rotate",
            StageKind::ColorAdjust => "color_adjust",
            StageKind::AudioOverlay => "audio_overlay",
            StageKind::Finalize => "finalize",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

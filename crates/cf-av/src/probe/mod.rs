//! Media probing.
//!
//! The [`MediaProbe`] trait is the seam between the pipeline and the probing
//! engine. [`FfprobeProbe`] implements it by shelling out to `ffprobe`.

pub mod ffprobe;
mod types;

pub use self::ffprobe::FfprobeProbe;
pub use self::types::{MediaInfo, MediaType, StreamInfo};

use std::path::Path;

use async_trait::async_trait;

/// Read-only metadata queries against a media file.
///
/// Implementations must be side-effect free: probing the same unchanged file
/// twice yields the same answer.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Short backend name used in log messages.
    fn name(&self) -> &'static str;

    /// Extract stream and container metadata.
    async fn probe(&self, path: &Path) -> cf_core::Result<MediaInfo>;

    /// Whether at least one stream has media type "audio".
    async fn has_audio_stream(&self, path: &Path) -> cf_core::Result<bool> {
        Ok(self.probe(path).await?.has_audio())
    }

    /// Container-reported duration in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`cf_core::Error::Probe`] when the container carries no
    /// duration.
    async fn duration_seconds(&self, path: &Path) -> cf_core::Result<f64> {
        self.probe(path)
            .await?
            .duration_seconds()
            .ok_or_else(|| cf_core::Error::probe(path, "container reports no duration"))
    }
}

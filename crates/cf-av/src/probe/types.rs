//! Media information types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Information about a media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Path to the media file.
    pub file_path: PathBuf,
    /// Container format as reported by the engine (e.g. "matroska,webm").
    pub container: Option<String>,
    /// Duration of the media.
    pub duration: Option<Duration>,
    /// All streams, in container order.
    pub streams: Vec<StreamInfo>,
}

/// A single stream descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Stream index within the container.
    pub index: u32,
    /// Media type tag.
    pub media_type: MediaType,
    /// Codec short name (e.g. "h264", "opus").
    pub codec: Option<String>,
}

/// Media type tag of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Video,
    Audio,
    Subtitle,
    Data,
    Attachment,
    Other,
}

impl MediaType {
    /// Map an ffprobe `codec_type` value.
    pub fn from_codec_type(codec_type: &str) -> Self {
        match codec_type {
            "video" => MediaType::Video,
            "audio" => MediaType::Audio,
            "subtitle" => MediaType::Subtitle,
            "data" => MediaType::Data,
            "attachment" => MediaType::Attachment,
            _ => MediaType::Other,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MediaType::Video => "video",
            MediaType::Audio => "audio",
            MediaType::Subtitle => "subtitle",
            MediaType::Data => "data",
            MediaType::Attachment => "attachment",
            MediaType::Other => "other",
        };
        f.write_str(s)
    }
}

impl MediaInfo {
    /// Check if any stream carries audio.
    pub fn has_audio(&self) -> bool {
        self.streams.iter().any(|s| s.media_type == MediaType::Audio)
    }

    /// Number of streams of the given type.
    pub fn count(&self, media_type: MediaType) -> usize {
        self.streams
            .iter()
            .filter(|s| s.media_type == media_type)
            .count()
    }

    /// Duration in fractional seconds.
    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration.map(|d| d.as_secs_f64())
    }
}

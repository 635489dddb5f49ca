//! Application configuration types.
//!
//! The top-level [`Config`] struct carries the tool, encoding and working
//! directory settings. Every section defaults sensibly so an empty file is
//! valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory for temporary artifacts, created if missing. Defaults to
    /// the nearest existing directory above the final output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
    pub tools: ToolsConfig,
    pub encoding: EncodingConfig,
}

impl Config {
    /// Check hard constraints and collect non-fatal warnings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when a value would make every run
    /// fail (zero timeouts, empty codec names, zero sample rate).
    pub fn validate(&self) -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        if self.tools.probe_timeout_secs == 0 {
            return Err(Error::configuration("tools.probe_timeout_secs must be > 0"));
        }
        if self.tools.transcode_timeout_secs == 0 {
            return Err(Error::configuration(
                "tools.transcode_timeout_secs must be > 0",
            ));
        }

        for (key, value) in [
            ("encoding.container", &self.encoding.container),
            ("encoding.video_codec", &self.encoding.video_codec),
            ("encoding.audio_codec", &self.encoding.audio_codec),
        ] {
            if value.trim().is_empty() {
                return Err(Error::configuration(format!("{key} must not be empty")));
            }
        }

        if self.encoding.base_sample_rate == 0 {
            return Err(Error::configuration(
                "encoding.base_sample_rate must be > 0",
            ));
        }

        for (key, path) in [
            ("tools.ffmpeg_path", &self.tools.ffmpeg_path),
            ("tools.ffprobe_path", &self.tools.ffprobe_path),
        ] {
            if let Some(path) = path {
                if !path.exists() {
                    warnings.push(format!(
                        "{key} {} does not exist; falling back to PATH",
                        path.display()
                    ));
                }
            }
        }

        if let Some(dir) = &self.work_dir {
            if dir.exists() && !dir.is_dir() {
                warnings.push(format!("work_dir {} is not a directory", dir.display()));
            }
        }

        Ok(warnings)
    }
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// Locations and time budgets for the external engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffprobe_path: Option<PathBuf>,
    /// Budget for a single ffprobe call.
    pub probe_timeout_secs: u64,
    /// Budget for a single ffmpeg stage.
    pub transcode_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            probe_timeout_secs: 30,
            transcode_timeout_secs: 3600,
        }
    }
}

impl ToolsConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Codec baseline used by the stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// Extension of the working and final container.
    pub container: String,
    /// Encoder used whenever video is re-encoded.
    pub video_codec: String,
    /// Encoder used whenever audio is re-encoded.
    pub audio_codec: String,
    /// Sample rate the pitch factor is applied to.
    pub base_sample_rate: u32,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            container: "mp4".to_string(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            base_sample_rate: 44_100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn default_config_is_valid() {
        let warnings = Config::default().validate().unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn empty_json_yields_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.tools.probe_timeout_secs, 30);
        assert_eq!(config.tools.transcode_timeout_secs, 3600);
        assert_eq!(config.encoding.container, "mp4");
        assert_eq!(config.encoding.base_sample_rate, 44_100);
        assert!(config.work_dir.is_none());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"tools": {"probe_timeout_secs": 5}}"#).unwrap();
        assert_eq!(config.tools.probe_timeout(), Duration::from_secs(5));
        assert_eq!(config.tools.transcode_timeout(), Duration::from_secs(3600));
    }

    #[test]
    fn zero_timeout_is_an_error() {
        let mut config = Config::default();
        config.tools.transcode_timeout_secs = 0;
        assert_matches!(config.validate(), Err(Error::Configuration(_)));
    }

    #[test]
    fn empty_codec_is_an_error() {
        let mut config = Config::default();
        config.encoding.video_codec = " ".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("encoding.video_codec"));
    }

    #[test]
    fn missing_tool_path_is_a_warning() {
        let mut config = Config::default();
        config.tools.ffmpeg_path = Some(PathBuf::from("/nonexistent/ffmpeg_xyz"));
        let warnings = config.validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("tools.ffmpeg_path"));
    }
}

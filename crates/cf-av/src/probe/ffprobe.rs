//! FFprobe-based [`MediaProbe`] implementation.
//!
//! Shells out to `ffprobe -v error -print_format json -show_format -show_streams`
//! and maps the JSON output into [`MediaInfo`].

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::types::{MediaInfo, MediaType, StreamInfo};
use super::MediaProbe;
use crate::command::stderr_excerpt;
use crate::tools::{ToolConfig, ToolRegistry};

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    tool: ToolConfig,
}

impl FfprobeProbe {
    /// Create a new prober for the given tool entry.
    pub fn new(tool: ToolConfig) -> Self {
        Self { tool }
    }

    /// Create a prober from the registry's `ffprobe` entry.
    pub fn from_registry(tools: &ToolRegistry) -> cf_core::Result<Self> {
        Ok(Self::new(tools.require("ffprobe")?.clone()))
    }

    /// Builder: override the per-call time budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.tool.timeout = timeout;
        self
    }
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    async fn probe(&self, path: &Path) -> cf_core::Result<MediaInfo> {
        tracing::debug!("probing {}", path.display());

        let mut cmd = self.tool.command();
        cmd.args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ]);
        cmd.arg(path.to_string_lossy().as_ref());

        let output = cmd.execute().await.map_err(|e| match e {
            cf_core::Error::ToolExit {
                exit_code, stderr, ..
            } => {
                let excerpt = stderr_excerpt(&stderr);
                let message = if excerpt.is_empty() {
                    format!("ffprobe exited with code {exit_code:?}")
                } else {
                    excerpt
                };
                cf_core::Error::probe(path, message)
            }
            other => other,
        })?;

        let ff: FfprobeOutput = serde_json::from_str(&output.stdout)
            .map_err(|e| cf_core::Error::probe(path, format!("ffprobe JSON parse error: {e}")))?;

        Ok(parse_ffprobe_output(path, ff))
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    index: u32,
    codec_type: Option<String>,
    codec_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn parse_ffprobe_output(path: &Path, output: FfprobeOutput) -> MediaInfo {
    let duration = output.format.duration.as_deref().and_then(parse_duration);

    let streams = output
        .streams
        .into_iter()
        .map(|s| StreamInfo {
            index: s.index,
            media_type: MediaType::from_codec_type(s.codec_type.as_deref().unwrap_or("")),
            codec: s.codec_name,
        })
        .collect();

    MediaInfo {
        file_path: path.to_path_buf(),
        container: output.format.format_name,
        duration,
        streams,
    }
}

/// Parse ffprobe's decimal seconds ("12.345000"); "N/A" and negatives yield `None`.
fn parse_duration(s: &str) -> Option<Duration> {
    let secs = s.trim().parse::<f64>().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}

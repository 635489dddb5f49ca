//! Transcode stages: a declarative description of one engine invocation and
//! the runner that executes it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use cf_core::{Error, Result, StageKind};

use crate::command::stderr_excerpt;
use crate::tools::{ToolConfig, ToolRegistry};

/// Per-stream codec choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Codec {
    /// Pass the stream through untouched.
    Copy,
    /// Re-encode with the named encoder.
    Encode(String),
}

impl Codec {
    pub fn encode(name: impl Into<String>) -> Self {
        Codec::Encode(name.into())
    }

    /// The engine's name for this choice.
    pub fn as_arg(&self) -> &str {
        match self {
            Codec::Copy => "copy",
            Codec::Encode(name) => name,
        }
    }
}

/// One input file of a stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageInput {
    pub path: PathBuf,
    /// Repeat this input indefinitely (bounded by the stage's duration limit).
    pub loop_forever: bool,
}

impl StageInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loop_forever: false,
        }
    }

    pub fn looped(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loop_forever: true,
        }
    }
}

/// Everything the engine needs to produce one output artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSpec {
    pub stage: StageKind,
    pub inputs: Vec<StageInput>,
    pub video_filters: Vec<String>,
    pub audio_filters: Vec<String>,
    pub video_codec: Codec,
    pub audio_codec: Codec,
    /// Explicit stream mapping; empty means the engine's default selection.
    pub maps: Vec<String>,
    /// Truncate the output to this many seconds.
    pub duration_limit: Option<f64>,
}

impl StageSpec {
    /// A stage reading a single input and copying every stream.
    pub fn new(stage: StageKind, input: impl Into<PathBuf>) -> Self {
        Self {
            stage,
            inputs: vec![StageInput::new(input)],
            video_filters: Vec::new(),
            audio_filters: Vec::new(),
            video_codec: Codec::Copy,
            audio_codec: Codec::Copy,
            maps: Vec::new(),
            duration_limit: None,
        }
    }

    pub fn with_input(mut self, input: StageInput) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn with_video_filter(mut self, filter: impl Into<String>) -> Self {
        self.video_filters.push(filter.into());
        self
    }

    pub fn with_audio_filter(mut self, filter: impl Into<String>) -> Self {
        self.audio_filters.push(filter.into());
        self
    }

    pub fn with_video_codec(mut self, codec: Codec) -> Self {
        self.video_codec = codec;
        self
    }

    pub fn with_audio_codec(mut self, codec: Codec) -> Self {
        self.audio_codec = codec;
        self
    }

    pub fn with_map(mut self, map: impl Into<String>) -> Self {
        self.maps.push(map.into());
        self
    }

    pub fn with_duration_limit(mut self, seconds: f64) -> Self {
        self.duration_limit = Some(seconds);
        self
    }

    /// Engine arguments writing to `output`.
    pub fn to_args(&self, output: &Path) -> Vec<String> {
        build_args(self, output)
    }
}

/// Translate a [`StageSpec`] into ffmpeg arguments.
///
/// Layout: `-y -hide_banner -nostdin [-stream_loop -1] -i <in>… [-vf ..]
/// [-af ..] [-map ..]… -c:v .. -c:a .. [-t ..] <out>`.
pub fn build_args(spec: &StageSpec, output: &Path) -> Vec<String> {
    let mut args: Vec<String> = vec!["-y".into(), "-hide_banner".into(), "-nostdin".into()];

    for input in &spec.inputs {
        if input.loop_forever {
            args.push("-stream_loop".into());
            args.push("-1".into());
        }
        args.push("-i".into());
        args.push(input.path.to_string_lossy().to_string());
    }

    if !spec.video_filters.is_empty() {
        args.push("-vf".into());
        args.push(spec.video_filters.join(","));
    }
    if !spec.audio_filters.is_empty() {
        args.push("-af".into());
        args.push(spec.audio_filters.join(","));
    }

    for map in &spec.maps {
        args.push("-map".into());
        args.push(map.clone());
    }

    args.push("-c:v".into());
    args.push(spec.video_codec.as_arg().to_string());
    args.push("-c:a".into());
    args.push(spec.audio_codec.as_arg().to_string());

    if let Some(limit) = spec.duration_limit {
        args.push("-t".into());
        args.push(format_seconds(limit));
    }

    args.push(output.to_string_lossy().to_string());
    args
}

/// Render seconds without a trailing `.0` for whole values.
fn format_seconds(seconds: f64) -> String {
    let rendered = format!("{seconds:.3}");
    let trimmed = rendered.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Executes one transcode stage.
///
/// A runner writes exactly one artifact at `output` and never deletes it,
/// even on failure; cleanup belongs to the artifact manager.
#[async_trait]
pub trait StageRunner: Send + Sync {
    async fn run(&self, spec: &StageSpec, output: &Path) -> Result<()>;
}

/// [`StageRunner`] backed by the `ffmpeg` CLI.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    tool: ToolConfig,
}

impl FfmpegRunner {
    pub fn new(tool: ToolConfig) -> Self {
        Self { tool }
    }

    /// Create a runner from the registry's `ffmpeg` entry.
    pub fn from_registry(tools: &ToolRegistry) -> Result<Self> {
        Ok(Self::new(tools.require("ffmpeg")?.clone()))
    }

    /// Builder: override the per-stage time budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.tool.timeout = timeout;
        self
    }
}

#[async_trait]
impl StageRunner for FfmpegRunner {
    async fn run(&self, spec: &StageSpec, output: &Path) -> Result<()> {
        let mut cmd = self.tool.command();
        cmd.args(build_args(spec, output));

        tracing::debug!("{} stage -> {}", spec.stage, output.display());

        cmd.execute().await.map_err(|e| match e {
            Error::ToolExit {
                exit_code, stderr, ..
            } => Error::Transcode {
                exit_code,
                stderr_excerpt: stderr_excerpt(&stderr),
            },
            other => other,
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn args(spec: &StageSpec) -> Vec<String> {
        build_args(spec, Path::new("/work/out.mp4"))
    }

    #[test]
    fn copy_stage_arguments() {
        let spec = StageSpec::new(StageKind::Normalize, "/in/source.webm")
            .with_video_codec(Codec::encode("libx264"));
        assert_eq!(
            args(&spec),
            vec![
                "-y",
                "-hide_banner",
                "-nostdin",
                "-i",
                "/in/source.webm",
                "-c:v",
                "libx264",
                "-c:a",
                "copy",
                "/work/out.mp4",
            ]
        );
    }

    #[test]
    fn filters_are_comma_joined() {
        let spec = StageSpec::new(StageKind::ColorAdjust, "/in/a.mp4")
            .with_video_filter("eq=brightness=0.1")
            .with_video_filter("hflip")
            .with_audio_filter("asetrate=48000");
        let args = args(&spec);
        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert_eq!(args[vf + 1], "eq=brightness=0.1,hflip");
        let af = args.iter().position(|a| a == "-af").unwrap();
        assert_eq!(args[af + 1], "asetrate=48000");
    }

    #[test]
    fn looped_input_and_duration_limit() {
        let spec = StageSpec::new(StageKind::AudioOverlay, "/work/video.mp4")
            .with_input(StageInput::looped("/in/track.mp3"))
            .with_map("0:v:0")
            .with_map("1:a:0")
            .with_duration_limit(8.0);
        let args = args(&spec);

        let loop_pos = args.iter().position(|a| a == "-stream_loop").unwrap();
        assert_eq!(args[loop_pos + 1], "-1");
        assert_eq!(args[loop_pos + 2], "-i");
        assert_eq!(args[loop_pos + 3], "/in/track.mp3");

        let maps: Vec<&String> = args
            .iter()
            .enumerate()
            .filter(|(i, _)| *i > 0 && args[i - 1] == "-map")
            .map(|(_, a)| a)
            .collect();
        assert_eq!(maps, vec!["0:v:0", "1:a:0"]);

        let t = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "8");
        assert_eq!(args.last().unwrap(), "/work/out.mp4");
    }

    #[test]
    fn seconds_formatting() {
        assert_eq!(format_seconds(10.0), "10");
        assert_eq!(format_seconds(10.5), "10.5");
        assert_eq!(format_seconds(3.14159), "3.142");
        assert_eq!(format_seconds(0.0), "0");
    }

    #[tokio::test]
    async fn non_zero_exit_becomes_transcode_error() {
        // `false` ignores its arguments and exits 1.
        let Ok(false_bin) = which::which("false") else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let runner = FfmpegRunner::new(ToolConfig {
            name: "ffmpeg".into(),
            path: false_bin,
            timeout: Duration::from_secs(10),
        });
        let spec = StageSpec::new(StageKind::Rotate, "/in/a.mp4")
            .with_video_filter("rotate=1.570796");

        let err = runner
            .run(&spec, &dir.path().join("out.mp4"))
            .await
            .unwrap_err();
        assert_matches!(err, Error::Transcode { exit_code: Some(1), .. });
    }

    #[tokio::test]
    async fn missing_engine_is_tool_not_found() {
        let runner = FfmpegRunner::new(ToolConfig {
            name: "ffmpeg".into(),
            path: PathBuf::from("/nonexistent/ffmpeg_xyz"),
            timeout: Duration::from_secs(5),
        });
        let spec = StageSpec::new(StageKind::Normalize, "/in/a.webm");
        let err = runner.run(&spec, Path::new("/tmp/out.mp4")).await.unwrap_err();
        assert_matches!(err, Error::ToolNotFound { .. });
    }
}

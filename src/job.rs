//! Turning command-line arguments into a pipeline run.

use std::path::PathBuf;

use cf_av::ToolRegistry;
use cf_core::config::Config;
use cf_core::{ColorAdjustment, Error, PipelineOptions, PipelineRequest, Result};
use cf_pipeline::{PipelineOrchestrator, PipelineOutcome, ProgressSender, RunContext};
use tokio_util::sync::CancellationToken;

/// Arguments of the `run` command.
#[derive(Debug, Clone, Default)]
pub struct JobArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub audio: Option<PathBuf>,
    pub override_audio: bool,
    pub pitch: Option<f64>,
    pub rotate: Option<f64>,
    pub brightness: Option<f64>,
    pub contrast: Option<f64>,
    pub saturation: Option<f64>,
}

impl JobArgs {
    /// Colour correction, enabled when any coefficient is given.
    pub fn color_adjustment(&self) -> Option<ColorAdjustment> {
        if self.brightness.is_none() && self.contrast.is_none() && self.saturation.is_none() {
            return None;
        }
        let neutral = ColorAdjustment::default();
        Some(ColorAdjustment {
            brightness: self.brightness.unwrap_or(neutral.brightness),
            contrast: self.contrast.unwrap_or(neutral.contrast),
            saturation: self.saturation.unwrap_or(neutral.saturation),
        })
    }

    pub fn options(&self) -> PipelineOptions {
        PipelineOptions {
            pitch_factor: self.pitch,
            rotation_degrees: self.rotate,
            color_adjustment: self.color_adjustment(),
            override_audio: self.override_audio,
        }
    }

    /// Build the request; a directory output is named `<source stem>.<container>`.
    pub fn to_request(&self, container: &str) -> Result<PipelineRequest> {
        let request = match (&self.output, &self.output_dir) {
            (Some(output), _) => PipelineRequest::new(self.input.clone(), output.clone()),
            (None, Some(dir)) => PipelineRequest::into_directory(self.input.clone(), dir, container)?,
            (None, None) => {
                return Err(Error::configuration(
                    "either an output file or an output directory is required",
                ))
            }
        };

        let request = match &self.audio {
            Some(audio) => request.with_replacement_audio(audio.clone()),
            None => request,
        };
        Ok(request.with_options(self.options()))
    }
}

/// Run one job against the discovered engines, logging each transition.
pub async fn run_job(
    config: &Config,
    request: &PipelineRequest,
    cancellation: CancellationToken,
) -> Result<PipelineOutcome> {
    request.options.validate()?;

    let tools = ToolRegistry::discover(&config.tools);
    let orchestrator = PipelineOrchestrator::from_tools(&tools, config)?;

    let ctx = RunContext::new()
        .with_cancellation(cancellation)
        .with_progress(ProgressSender::new(|event| {
            tracing::info!("[{:.0}%] {}", event.percent, event.state);
        }));

    orchestrator.run(request, &ctx).await
}

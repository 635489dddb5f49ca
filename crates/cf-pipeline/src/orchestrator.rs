//! The pipeline state machine.
//!
//! A run walks `Init → Normalizing → [Pitching] → [Rotating] →
//! [ColorAdjusting] → [AudioOverlaying] → Finalizing → Done`, or drops to
//! `Errored` from any non-terminal state. Every intermediate file is a
//! per-run temporary artifact; all of them are released before `run`
//! returns, whatever the outcome.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cf_av::paths::{self, ArtifactPathResolver};
use cf_av::{
    FfmpegRunner, FfprobeProbe, MediaProbe, ReleaseReport, StageRunner, StageSpec,
    TempArtifactManager, ToolRegistry,
};
use cf_core::config::{Config, EncodingConfig};
use cf_core::{Error, PipelineRequest, Result, RunId, StageKind};
use serde::Serialize;

use crate::context::{ProgressEvent, ProgressSender, RunContext};
use crate::overlay::{overlay_spec, AudioTrackSelection, DurationAlignmentPlan};
use crate::stages::{edit_stages, normalize_spec, EditStage};

/// States of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Init,
    Normalizing,
    Pitching,
    Rotating,
    ColorAdjusting,
    AudioOverlaying,
    Finalizing,
    Done,
    Errored,
}

impl PipelineState {
    /// The state in which `stage` runs.
    pub fn for_stage(stage: StageKind) -> Self {
        match stage {
            StageKind::Normalize => PipelineState::Normalizing,
            StageKind::Pitch => PipelineState::Pitching,
            StageKind::Rotate => PipelineState::Rotating,
            StageKind::ColorAdjust => PipelineState::ColorAdjusting,
            StageKind::AudioOverlay => PipelineState::AudioOverlaying,
            StageKind::Finalize => PipelineState::Finalizing,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Errored)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Init => "init",
            PipelineState::Normalizing => "normalizing",
            PipelineState::Pitching => "pitching",
            PipelineState::Rotating => "rotating",
            PipelineState::ColorAdjusting => "color_adjusting",
            PipelineState::AudioOverlaying => "audio_overlaying",
            PipelineState::Finalizing => "finalizing",
            PipelineState::Done => "done",
            PipelineState::Errored => "errored",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orchestrator-wide settings taken from the application config.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorSettings {
    /// Directory for temporary artifacts; defaults to the final output's parent.
    pub work_dir: Option<PathBuf>,
    pub encoding: EncodingConfig,
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            work_dir: config.work_dir.clone(),
            encoding: config.encoding.clone(),
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub run_id: RunId,
    /// Absolute path of the finished artifact.
    pub output: PathBuf,
    /// Stages executed, in order.
    pub stages: Vec<StageKind>,
    /// Audio decision, when a replacement track was supplied.
    pub selection: Option<AudioTrackSelection>,
    /// Duration reconciliation, when the overlay ran.
    pub alignment: Option<DurationAlignmentPlan>,
    /// Cleanup result.
    pub released: ReleaseReport,
}

/// A validated request with every path resolved.
#[derive(Debug)]
struct PreparedRun {
    source: PathBuf,
    audio: Option<PathBuf>,
    final_output: PathBuf,
    work_dir: PathBuf,
    edits: Vec<EditStage>,
    override_audio: bool,
}

impl PreparedRun {
    /// Normalize, each edit, the overlay decision and finalization.
    fn total_steps(&self) -> usize {
        1 + self.edits.len() + usize::from(self.audio.is_some()) + 1
    }
}

/// Reports state transitions with a completion percentage.
struct Progress<'a> {
    sender: &'a ProgressSender,
    total: usize,
    completed: usize,
}

impl<'a> Progress<'a> {
    fn new(sender: &'a ProgressSender) -> Self {
        Self {
            sender,
            total: 0,
            completed: 0,
        }
    }

    fn plan(&mut self, total: usize) {
        self.total = total;
    }

    fn enter(&self, state: PipelineState) {
        let percent = if state == PipelineState::Done {
            100.0
        } else if self.total == 0 {
            0.0
        } else {
            self.completed as f32 / self.total as f32 * 100.0
        };
        tracing::debug!("[{percent:.0}%] {state}");
        self.sender.send(&ProgressEvent { state, percent });
    }

    fn complete(&mut self) {
        self.completed += 1;
    }
}

/// Sequences the stages of one job and guarantees cleanup.
pub struct PipelineOrchestrator {
    probe: Arc<dyn MediaProbe>,
    runner: Arc<dyn StageRunner>,
    settings: OrchestratorSettings,
}

impl PipelineOrchestrator {
    pub fn new(probe: Arc<dyn MediaProbe>, runner: Arc<dyn StageRunner>) -> Self {
        Self {
            probe,
            runner,
            settings: OrchestratorSettings::default(),
        }
    }

    /// Build an orchestrator driving the discovered ffprobe and ffmpeg.
    pub fn from_tools(tools: &ToolRegistry, config: &Config) -> Result<Self> {
        let probe = FfprobeProbe::from_registry(tools)?;
        let runner = FfmpegRunner::from_registry(tools)?;
        Ok(Self::new(Arc::new(probe), Arc::new(runner))
            .with_settings(OrchestratorSettings::from_config(config)))
    }

    /// Builder: replace the settings.
    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Run `request` to completion.
    ///
    /// # Errors
    ///
    /// Request problems found before any stage starts are returned as-is
    /// ([`Error::Configuration`], [`Error::NotFound`], [`Error::Filesystem`]).
    /// Everything after that is wrapped in [`Error::Stage`] naming the stage
    /// that failed. Temporary artifacts are gone by the time either returns.
    pub async fn run(&self, request: &PipelineRequest, ctx: &RunContext) -> Result<PipelineOutcome> {
        let run_id = RunId::new();
        let mut progress = Progress::new(&ctx.progress);
        progress.enter(PipelineState::Init);

        let prepared = match self.prepare(request) {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::error!("Run {run_id} rejected: {e}");
                progress.enter(PipelineState::Errored);
                return Err(e);
            }
        };
        progress.plan(prepared.total_steps());
        tracing::info!(
            "Run {run_id}: {} -> {}",
            prepared.source.display(),
            prepared.final_output.display()
        );

        let mut artifacts = TempArtifactManager::new(&prepared.work_dir, run_id);
        let result = self
            .execute(&prepared, ctx, &mut artifacts, &mut progress)
            .await;
        let released = artifacts.release_all();
        tracing::debug!("Run {run_id} cleanup: {released:?}");

        match result {
            Ok(mut outcome) => {
                outcome.released = released;
                progress.enter(PipelineState::Done);
                tracing::info!("Run {run_id} done: {}", outcome.output.display());
                Ok(outcome)
            }
            Err(e) => {
                progress.enter(PipelineState::Errored);
                tracing::error!("Run {run_id} failed: {e}");
                Err(e)
            }
        }
    }

    /// Validate the request and resolve its paths (the `Init` state).
    fn prepare(&self, request: &PipelineRequest) -> Result<PreparedRun> {
        request.options.validate()?;

        let resolver = ArtifactPathResolver::from_current_dir()?;

        let source = resolver.resolve(&request.source_video);
        if !source.is_file() {
            return Err(Error::not_found("source video", source.display()));
        }

        let audio = match &request.replacement_audio {
            Some(path) => {
                let path = resolver.resolve(path);
                if !path.is_file() {
                    return Err(Error::not_found("replacement audio", path.display()));
                }
                Some(path)
            }
            None => None,
        };

        let final_output = resolver.resolve(&request.final_output);
        if final_output == source {
            return Err(Error::configuration(format!(
                "final output {} would overwrite the source video",
                final_output.display()
            )));
        }
        if final_output.is_dir() {
            return Err(Error::configuration(format!(
                "final output {} is a directory",
                final_output.display()
            )));
        }

        if request.options.override_audio && audio.is_none() {
            tracing::warn!("override_audio is set but no replacement audio was given; ignoring");
        }

        // The output directory itself is only created by a successful finalize.
        let work_dir = match &self.settings.work_dir {
            Some(dir) => {
                let dir = resolver.resolve(dir);
                paths::ensure_dir(&dir)?;
                dir
            }
            None => final_output
                .ancestors()
                .skip(1)
                .find(|dir| dir.is_dir())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| resolver.base().to_path_buf()),
        };

        Ok(PreparedRun {
            source,
            audio,
            final_output,
            work_dir,
            edits: edit_stages(&request.options),
            override_audio: request.options.override_audio,
        })
    }

    async fn execute(
        &self,
        run: &PreparedRun,
        ctx: &RunContext,
        artifacts: &mut TempArtifactManager,
        progress: &mut Progress<'_>,
    ) -> Result<PipelineOutcome> {
        let encoding = &self.settings.encoding;
        let mut stages = Vec::new();

        progress.enter(PipelineState::Normalizing);
        let video_has_audio = match &run.audio {
            Some(_) => Some(
                cancellable(ctx, self.probe.has_audio_stream(&run.source))
                    .await
                    .map_err(|e| e.in_stage(StageKind::Normalize))?,
            ),
            None => None,
        };
        let mut working = self
            .run_stage(ctx, artifacts, normalize_spec(&run.source, encoding))
            .await?;
        stages.push(StageKind::Normalize);
        progress.complete();

        for edit in &run.edits {
            progress.enter(PipelineState::for_stage(edit.kind()));
            working = self
                .run_stage(ctx, artifacts, edit.spec(&working, encoding))
                .await?;
            stages.push(edit.kind());
            progress.complete();
        }

        let mut selection = None;
        let mut alignment = None;
        if let (Some(audio), Some(has_audio)) = (&run.audio, video_has_audio) {
            let decided = AudioTrackSelection::decide(run.override_audio, has_audio);
            selection = Some(decided);

            match decided {
                AudioTrackSelection::KeepAll => {
                    tracing::info!("Video already has audio; keeping it and skipping overlay");
                }
                AudioTrackSelection::Replace => {
                    progress.enter(PipelineState::AudioOverlaying);
                    let plan = self
                        .plan_alignment(ctx, &working, audio)
                        .await
                        .map_err(|e| e.in_stage(StageKind::AudioOverlay))?;
                    tracing::info!(
                        "Overlay plan: {:?} to {:.3}s",
                        plan.strategy,
                        plan.target_duration_seconds
                    );
                    working = self
                        .run_stage(ctx, artifacts, overlay_spec(&working, audio, &plan, decided))
                        .await?;
                    stages.push(StageKind::AudioOverlay);
                    alignment = Some(plan);
                }
            }
            progress.complete();
        }

        progress.enter(PipelineState::Finalizing);
        finalize(ctx, &working, &run.final_output)
            .await
            .map_err(|e| e.in_stage(StageKind::Finalize))?;
        stages.push(StageKind::Finalize);
        progress.complete();

        Ok(PipelineOutcome {
            run_id: artifacts.run_id(),
            output: run.final_output.clone(),
            stages,
            selection,
            alignment,
            released: ReleaseReport::default(),
        })
    }

    /// Run one engine stage into a freshly tracked artifact.
    async fn run_stage(
        &self,
        ctx: &RunContext,
        artifacts: &mut TempArtifactManager,
        spec: StageSpec,
    ) -> Result<PathBuf> {
        let stage = spec.stage;
        let output = artifacts.allocate(stage, &self.settings.encoding.container);

        tracing::info!("Starting: {stage}");
        cancellable(ctx, self.runner.run(&spec, output.path()))
            .await
            .map_err(|e| e.in_stage(stage))?;
        tracing::info!("Completed: {stage}");

        Ok(output.path().to_path_buf())
    }

    /// Measure both durations right before the overlay.
    async fn plan_alignment(
        &self,
        ctx: &RunContext,
        video: &Path,
        audio: &Path,
    ) -> Result<DurationAlignmentPlan> {
        let video_seconds = cancellable(ctx, self.probe.duration_seconds(video)).await?;
        let audio_seconds = cancellable(ctx, self.probe.duration_seconds(audio)).await?;
        tracing::debug!("video {video_seconds:.3}s, audio {audio_seconds:.3}s");
        Ok(DurationAlignmentPlan::plan(video_seconds, audio_seconds))
    }
}

impl fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("probe", &self.probe.name())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Race `fut` against the run's cancellation token.
///
/// Losing the race drops `fut`, which kills any engine process it spawned.
async fn cancellable<T>(ctx: &RunContext, fut: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::select! {
        biased;
        _ = ctx.cancellation.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

/// Move the working artifact to its destination, copying across filesystems.
async fn finalize(ctx: &RunContext, working: &Path, final_output: &Path) -> Result<()> {
    if ctx.cancellation.is_cancelled() {
        return Err(Error::Cancelled);
    }
    paths::ensure_parent_dir(final_output)?;

    if let Err(e) = tokio::fs::rename(working, final_output).await {
        tracing::debug!("rename into place failed ({e}); copying");
        tokio::fs::copy(working, final_output)
            .await
            .map_err(|e| Error::filesystem(final_output, e))?;
    }
    Ok(())
}

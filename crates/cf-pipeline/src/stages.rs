//! The optional edit stages and the always-on normalization stage.
//!
//! Edit stages are chosen declaratively: [`EDIT_CHAIN`] lists, in execution
//! order, one selector per stage that inspects the options and yields the
//! stage when it is enabled.

use std::f64::consts::PI;
use std::path::Path;

use cf_av::{Codec, StageSpec};
use cf_core::config::EncodingConfig;
use cf_core::{ColorAdjustment, PipelineOptions, StageKind};

/// An optional transformation of the working artifact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditStage {
    /// Resample the audio by this rate multiplier.
    Pitch(f64),
    /// Rotate the picture clockwise by this many degrees.
    Rotate(f64),
    /// Apply brightness/contrast/saturation correction.
    Color(ColorAdjustment),
}

type StageSelector = fn(&PipelineOptions) -> Option<EditStage>;

/// Edit stages in execution order.
const EDIT_CHAIN: &[StageSelector] = &[
    |options| options.pitch_factor.map(EditStage::Pitch),
    |options| options.effective_rotation().map(EditStage::Rotate),
    |options| options.color_adjustment.map(EditStage::Color),
];

/// The edit stages enabled by `options`, in the order they run.
pub fn edit_stages(options: &PipelineOptions) -> Vec<EditStage> {
    EDIT_CHAIN.iter().filter_map(|select| select(options)).collect()
}

impl EditStage {
    pub fn kind(&self) -> StageKind {
        match self {
            EditStage::Pitch(_) => StageKind::Pitch,
            EditStage::Rotate(_) => StageKind::Rotate,
            EditStage::Color(_) => StageKind::ColorAdjust,
        }
    }

    /// The engine invocation transforming `input`.
    ///
    /// The filtered stream is re-encoded; the other stream is copied.
    pub fn spec(&self, input: &Path, encoding: &EncodingConfig) -> StageSpec {
        let base = StageSpec::new(self.kind(), input);
        match self {
            EditStage::Pitch(factor) => {
                let rate = (f64::from(encoding.base_sample_rate) * factor).round() as u64;
                base.with_audio_filter(format!("asetrate={rate}"))
                    .with_video_codec(Codec::Copy)
                    .with_audio_codec(Codec::encode(&encoding.audio_codec))
            }
            EditStage::Rotate(degrees) => base
                .with_video_filter(format!("rotate={:.6}", degrees * PI / 180.0))
                .with_video_codec(Codec::encode(&encoding.video_codec))
                .with_audio_codec(Codec::Copy),
            EditStage::Color(color) => base
                .with_video_filter(format!(
                    "eq=brightness={}:contrast={}:saturation={}",
                    color.brightness, color.contrast, color.saturation
                ))
                .with_video_codec(Codec::encode(&encoding.video_codec))
                .with_audio_codec(Codec::Copy),
        }
    }
}

/// Re-encode the source into the working baseline.
pub fn normalize_spec(source: &Path, encoding: &EncodingConfig) -> StageSpec {
    StageSpec::new(StageKind::Normalize, source)
        .with_video_codec(Codec::encode(&encoding.video_codec))
        .with_audio_codec(Codec::Copy)
}

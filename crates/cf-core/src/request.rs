//! The job model: what to transform and how.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Coefficients for the colour-correction stage.
///
/// Unspecified coefficients default to the neutral values of the `eq`
/// filter (brightness 0, contrast 1, saturation 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorAdjustment {
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
}

impl Default for ColorAdjustment {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 1.0,
            saturation: 1.0,
        }
    }
}

/// Tuning options for a single job.
///
/// Every optional stage is enabled by the presence of its option.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Resample-rate multiplier applied to the audio track.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch_factor: Option<f64>,
    /// Clockwise rotation in degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_degrees: Option<f64>,
    /// Colour correction coefficients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_adjustment: Option<ColorAdjustment>,
    /// Replace the original audio even when the video already has some.
    pub override_audio: bool,
}

impl PipelineOptions {
    /// Reject values the engine cannot act on.
    pub fn validate(&self) -> Result<()> {
        if let Some(factor) = self.pitch_factor {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(Error::configuration(format!(
                    "pitch factor must be a positive number, got {factor}"
                )));
            }
        }

        if let Some(degrees) = self.rotation_degrees {
            if !degrees.is_finite() {
                return Err(Error::configuration(format!(
                    "rotation must be a finite number of degrees, got {degrees}"
                )));
            }
        }

        if let Some(color) = &self.color_adjustment {
            for (name, value) in [
                ("brightness", color.brightness),
                ("contrast", color.contrast),
                ("saturation", color.saturation),
            ] {
                if !value.is_finite() {
                    return Err(Error::configuration(format!(
                        "color {name} must be a finite number, got {value}"
                    )));
                }
            }
        }

        Ok(())
    }

    /// The rotation to apply, treating a zero angle as no rotation.
    pub fn effective_rotation(&self) -> Option<f64> {
        self.rotation_degrees.filter(|d| *d != 0.0)
    }
}

/// Identifies one processing job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRequest {
    /// The input video. Never modified.
    pub source_video: PathBuf,
    /// Optional audio track to overlay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_audio: Option<PathBuf>,
    /// Where the finished artifact is written.
    pub final_output: PathBuf,
    #[serde(default)]
    pub options: PipelineOptions,
}

impl PipelineRequest {
    /// Create a request with no optional stages.
    pub fn new(source_video: impl Into<PathBuf>, final_output: impl Into<PathBuf>) -> Self {
        Self {
            source_video: source_video.into(),
            replacement_audio: None,
            final_output: final_output.into(),
            options: PipelineOptions::default(),
        }
    }

    /// Create a request whose output lands in `output_dir`, named after the
    /// source file with the given container extension.
    pub fn into_directory(
        source_video: impl Into<PathBuf>,
        output_dir: &Path,
        container: &str,
    ) -> Result<Self> {
        let source_video = source_video.into();
        let stem = source_video.file_stem().ok_or_else(|| {
            Error::configuration(format!(
                "cannot derive an output name from {}",
                source_video.display()
            ))
        })?;

        let mut file_name = stem.to_os_string();
        file_name.push(".");
        file_name.push(container);
        let final_output = output_dir.join(file_name);

        Ok(Self::new(source_video, final_output))
    }

    /// Builder: overlay the given audio track.
    pub fn with_replacement_audio(mut self, audio: impl Into<PathBuf>) -> Self {
        self.replacement_audio = Some(audio.into());
        self
    }

    /// Builder: set the tuning options.
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn default_options_are_valid() {
        assert!(PipelineOptions::default().validate().is_ok());
    }

    #[test]
    fn non_positive_pitch_is_rejected() {
        for factor in [0.0, -1.5, f64::NAN, f64::INFINITY] {
            let options = PipelineOptions {
                pitch_factor: Some(factor),
                ..Default::default()
            };
            assert_matches!(options.validate(), Err(Error::Configuration(_)));
        }
    }

    #[test]
    fn non_finite_color_is_rejected() {
        let options = PipelineOptions {
            color_adjustment: Some(ColorAdjustment {
                contrast: f64::NAN,
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("contrast"), "got: {err}");
    }

    #[test]
    fn zero_rotation_is_not_effective() {
        let mut options = PipelineOptions {
            rotation_degrees: Some(0.0),
            ..Default::default()
        };
        assert_eq!(options.effective_rotation(), None);
        options.rotation_degrees = Some(90.0);
        assert_eq!(options.effective_rotation(), Some(90.0));
    }

    #[test]
    fn color_adjustment_defaults_missing_fields() {
        let color: ColorAdjustment = serde_json::from_str(r#"{"brightness": 0.3}"#).unwrap();
        assert_eq!(color.brightness, 0.3);
        assert_eq!(color.contrast, 1.0);
        assert_eq!(color.saturation, 1.0);
    }

    #[test]
    fn into_directory_uses_source_stem() {
        let req =
            PipelineRequest::into_directory("/media/in/item.webm", Path::new("/media/out"), "mp4")
                .unwrap();
        assert_eq!(req.final_output, PathBuf::from("/media/out/item.mp4"));
        assert_eq!(req.source_video, PathBuf::from("/media/in/item.webm"));
    }

    #[test]
    fn into_directory_rejects_stemless_source() {
        let result = PipelineRequest::into_directory("/", Path::new("/out"), "mp4");
        assert_matches!(result, Err(Error::Configuration(_)));
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let req: PipelineRequest = serde_json::from_str(
            r#"{"source_video": "a.webm", "final_output": "b.mp4"}"#,
        )
        .unwrap();
        assert!(req.replacement_audio.is_none());
        assert_eq!(req.options, PipelineOptions::default());
    }
}

//! Audio overlay planning: which audio ends up in the output, and how a
//! replacement track is stretched or cut to the video's length.

use std::path::Path;

use cf_av::{Codec, StageInput, StageSpec};
use cf_core::StageKind;
use serde::Serialize;

/// How the replacement audio is reconciled with the video duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStrategy {
    /// Audio is shorter than the video: repeat it, then cut at the video length.
    LoopAudio,
    /// Audio is at least as long as the video: play once, cut at the video length.
    TrimAudio,
}

/// Outcome of duration reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DurationAlignmentPlan {
    pub strategy: AlignmentStrategy,
    /// The video's duration; the overlay output is truncated to it.
    pub target_duration_seconds: f64,
}

impl DurationAlignmentPlan {
    /// Plan the overlay of an `audio_seconds` track onto a `video_seconds` video.
    ///
    /// Equal lengths are trimmed, never looped, so the audio does not repeat a
    /// frame at the boundary.
    pub fn plan(video_seconds: f64, audio_seconds: f64) -> Self {
        let strategy = if audio_seconds < video_seconds {
            AlignmentStrategy::LoopAudio
        } else {
            AlignmentStrategy::TrimAudio
        };
        Self {
            strategy,
            target_duration_seconds: video_seconds,
        }
    }
}

/// Which audio stream(s) the finished file carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioTrackSelection {
    /// Only the replacement track.
    Replace,
    /// Every original stream; the replacement track is not muxed in.
    KeepAll,
}

impl AudioTrackSelection {
    /// Replace when asked to, or when there is no original audio to keep.
    pub fn decide(override_audio: bool, video_has_audio: bool) -> Self {
        if override_audio || !video_has_audio {
            AudioTrackSelection::Replace
        } else {
            AudioTrackSelection::KeepAll
        }
    }

    /// Stream mapping for a `[video, replacement audio]` input pair.
    pub fn map_directives(&self) -> &'static [&'static str] {
        match self {
            AudioTrackSelection::Replace => &["0:v:0", "1:a:0"],
            AudioTrackSelection::KeepAll => &["0"],
        }
    }
}

/// Codec for the overlaid audio, chosen from the replacement file's extension.
pub fn audio_codec_for(audio: &Path) -> Codec {
    let ext = audio
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp3") => Codec::encode("libmp3lame"),
        Some("aac") => Codec::encode("aac"),
        _ => Codec::Copy,
    }
}

/// The overlay stage: video stream copied, replacement audio looped or cut,
/// output bounded to the planned duration.
pub fn overlay_spec(
    video: &Path,
    audio: &Path,
    plan: &DurationAlignmentPlan,
    selection: AudioTrackSelection,
) -> StageSpec {
    let audio_input = match plan.strategy {
        AlignmentStrategy::LoopAudio => StageInput::looped(audio),
        AlignmentStrategy::TrimAudio => StageInput::new(audio),
    };

    let mut spec = StageSpec::new(StageKind::AudioOverlay, video)
        .with_input(audio_input)
        .with_video_codec(Codec::Copy)
        .with_audio_codec(audio_codec_for(audio))
        .with_duration_limit(plan.target_duration_seconds);
    for map in selection.map_directives() {
        spec = spec.with_map(*map);
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorter_audio_loops_longer_audio_trims() {
        let durations = [0.5, 1.0, 3.0, 4.0, 8.0, 9.99, 10.0, 10.01, 15.0, 600.0];
        for &v in &durations {
            for &a in &durations {
                let plan = DurationAlignmentPlan::plan(v, a);
                let expected = if a < v {
                    AlignmentStrategy::LoopAudio
                } else {
                    AlignmentStrategy::TrimAudio
                };
                assert_eq!(plan.strategy, expected, "V={v} A={a}");
                assert_eq!(plan.target_duration_seconds, v);
            }
        }
    }

    #[test]
    fn equal_durations_never_loop() {
        let plan = DurationAlignmentPlan::plan(10.0, 10.0);
        assert_eq!(plan.strategy, AlignmentStrategy::TrimAudio);
    }

    #[test]
    fn selection_truth_table() {
        for override_audio in [false, true] {
            for has_audio in [false, true] {
                let selection = AudioTrackSelection::decide(override_audio, has_audio);
                let replace = override_audio || !has_audio;
                assert_eq!(
                    selection == AudioTrackSelection::Replace,
                    replace,
                    "override={override_audio} has_audio={has_audio}"
                );
            }
        }
    }

    #[test]
    fn codec_follows_extension() {
        assert_eq!(audio_codec_for(Path::new("a/track.mp3")), Codec::encode("libmp3lame"));
        assert_eq!(audio_codec_for(Path::new("a/track.AAC")), Codec::encode("aac"));
        assert_eq!(audio_codec_for(Path::new("a/track.m4a")), Codec::Copy);
        assert_eq!(audio_codec_for(Path::new("a/track")), Codec::Copy);
    }

    #[test]
    fn looped_overlay_spec() {
        let plan = DurationAlignmentPlan::plan(8.0, 3.0);
        let spec = overlay_spec(
            Path::new("/w/video.mp4"),
            Path::new("/in/loop.mp3"),
            &plan,
            AudioTrackSelection::Replace,
        );

        assert_eq!(spec.stage, StageKind::AudioOverlay);
        assert_eq!(spec.inputs.len(), 2);
        assert!(!spec.inputs[0].loop_forever);
        assert!(spec.inputs[1].loop_forever);
        assert_eq!(spec.maps, vec!["0:v:0", "1:a:0"]);
        assert_eq!(spec.video_codec, Codec::Copy);
        assert_eq!(spec.audio_codec, Codec::encode("libmp3lame"));
        assert_eq!(spec.duration_limit, Some(8.0));
    }

    #[test]
    fn trimmed_overlay_spec() {
        let plan = DurationAlignmentPlan::plan(10.0, 15.0);
        let spec = overlay_spec(
            Path::new("/w/video.mp4"),
            Path::new("/in/long.wav"),
            &plan,
            AudioTrackSelection::Replace,
        );
        assert!(spec.inputs.iter().all(|i| !i.loop_forever));
        assert_eq!(spec.audio_codec, Codec::Copy);
        assert_eq!(spec.duration_limit, Some(10.0));
    }
}

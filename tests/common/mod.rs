//! Shared helpers for tests that drive the real ffmpeg/ffprobe.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use cf_av::ToolRegistry;
use cf_core::config::ToolsConfig;

/// Registry with both engines, or `None` when the machine cannot run the
/// pipeline (missing tools, or an ffmpeg built without libx264).
pub fn engines() -> Option<ToolRegistry> {
    let tools = ToolRegistry::discover(&ToolsConfig::default());
    let ffmpeg = tools.require("ffmpeg").ok()?;
    tools.require("ffprobe").ok()?;

    let encoders = Command::new(&ffmpeg.path)
        .args(["-hide_banner", "-encoders"])
        .output()
        .ok()?;
    let listing = String::from_utf8_lossy(&encoders.stdout);
    if !listing.contains("libx264") {
        eprintln!("skipping: ffmpeg lacks libx264");
        return None;
    }
    Some(tools)
}

fn ffmpeg(tools: &ToolRegistry, args: &[&str], output: &Path) {
    let Ok(ffmpeg) = tools.require("ffmpeg") else {
        panic!("ffmpeg vanished");
    };
    let status = Command::new(&ffmpeg.path)
        .args(["-y", "-hide_banner", "-loglevel", "error"])
        .args(args)
        .arg(output)
        .status()
        .unwrap();
    assert!(status.success(), "fixture generation failed for {output:?}");
}

/// A silent test-pattern video of `seconds` length.
pub fn silent_video(tools: &ToolRegistry, dir: &Path, seconds: u32) -> PathBuf {
    let path = dir.join(format!("silent-{seconds}s.mp4"));
    let source = format!("testsrc=duration={seconds}:size=160x120:rate=10");
    ffmpeg(
        tools,
        &["-f", "lavfi", "-i", &source, "-c:v", "libx264", "-pix_fmt", "yuv420p"],
        &path,
    );
    path
}

/// A test-pattern video with a sine audio track.
pub fn video_with_audio(tools: &ToolRegistry, dir: &Path, seconds: u32) -> PathBuf {
    let path = dir.join(format!("voiced-{seconds}s.mp4"));
    let video = format!("testsrc=duration={seconds}:size=160x120:rate=10");
    let audio = format!("sine=frequency=330:duration={seconds}");
    ffmpeg(
        tools,
        &[
            "-f", "lavfi", "-i", &video, "-f", "lavfi", "-i", &audio, "-c:v", "libx264",
            "-pix_fmt", "yuv420p", "-c:a", "aac", "-shortest",
        ],
        &path,
    );
    path
}

/// A sine tone of `seconds` length in an ADTS `.aac` file.
pub fn tone(tools: &ToolRegistry, dir: &Path, seconds: u32) -> PathBuf {
    let path = dir.join(format!("tone-{seconds}s.aac"));
    let source = format!("sine=frequency=440:duration={seconds}");
    ffmpeg(tools, &["-f", "lavfi", "-i", &source, "-c:a", "aac"], &path);
    path
}

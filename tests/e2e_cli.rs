//! CLI end-to-end tests
//!
//! Tests for the clipforge command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the clipforge binary
#[allow(deprecated)]
fn clipforge_cmd() -> Command {
    Command::cargo_bin("clipforge").unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = clipforge_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = clipforge_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("clipforge"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = clipforge_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "clipforge {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_cli_check_tools_command() {
    let dir = tempdir().unwrap();
    let mut cmd = clipforge_cmd();
    cmd.current_dir(dir.path())
        .arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"))
        .stdout(predicate::str::contains("ffprobe"));
}

#[test]
fn test_cli_run_help() {
    let mut cmd = clipforge_cmd();
    cmd.args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Process a single video"))
        .stdout(predicate::str::contains("--override-audio"));
}

#[test]
fn test_cli_run_requires_an_output() {
    let mut cmd = clipforge_cmd();
    cmd.args(["run", "input.webm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output"));
}

#[test]
fn test_cli_run_rejects_both_output_forms() {
    let mut cmd = clipforge_cmd();
    cmd.args(["run", "input.webm", "-o", "a.mp4", "--output-dir", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_cli_run_rejects_non_positive_pitch() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("clip.webm");
    fs::write(&source, b"placeholder").unwrap();

    let mut cmd = clipforge_cmd();
    cmd.current_dir(dir.path())
        .args(["run", "clip.webm", "-o", "final.mp4", "--pitch", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("pitch factor"));
    assert!(!dir.path().join("final.mp4").exists());
}

#[test]
fn test_cli_run_missing_input() {
    let dir = tempdir().unwrap();
    let mut cmd = clipforge_cmd();
    cmd.current_dir(dir.path())
        .args(["run", "absent.webm", "-o", "final.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_cli_probe_missing_file() {
    let mut cmd = clipforge_cmd();
    cmd.args(["probe", "/nonexistent/clip.webm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_validate_valid_config() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("clipforge.toml");
    fs::write(
        &config_path,
        r#"
[encoding]
container = "mkv"

[tools]
probe_timeout_secs = 10
"#,
    )
    .unwrap();

    let mut cmd = clipforge_cmd();
    cmd.args(["validate", config_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("mkv"));
}

#[test]
fn test_cli_validate_invalid_config() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("clipforge.toml");
    fs::write(&config_path, "[encoding]\nvideo_codec = \"\"\n").unwrap();

    let mut cmd = clipforge_cmd();
    cmd.args(["validate", config_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("video_codec"));
}

#[test]
fn test_cli_validate_defaults_without_file() {
    let dir = tempdir().unwrap();
    let mut cmd = clipforge_cmd();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"));
}

#[test]
fn test_cli_run_end_to_end() {
    let Some(ffmpeg) = which::which("ffmpeg").ok() else {
        return;
    };
    if which::which("ffprobe").is_err() {
        return;
    }
    let encoders = Command::new(&ffmpeg)
        .args(["-hide_banner", "-encoders"])
        .output()
        .unwrap();
    if !String::from_utf8_lossy(&encoders.stdout).contains("libx264") {
        return;
    }

    let dir = tempdir().unwrap();
    let status = Command::new(&ffmpeg)
        .args([
            "-y", "-hide_banner", "-loglevel", "error", "-f", "lavfi", "-i",
            "testsrc=duration=2:size=160x120:rate=10", "-c:v", "libx264", "-pix_fmt", "yuv420p",
        ])
        .arg(dir.path().join("clip.mp4"))
        .status()
        .unwrap();
    assert!(status.success());

    let mut cmd = clipforge_cmd();
    cmd.current_dir(dir.path())
        .args([
            "run", "clip.mp4", "--output-dir", "out", "--rotate", "-90", "--brightness", "0.05",
            "--json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"stages\""))
        .stdout(predicate::str::contains("color_adjust"));

    let out: Vec<_> = fs::read_dir(dir.path().join("out"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(out, vec![std::ffi::OsString::from("clip.mp4")]);
}

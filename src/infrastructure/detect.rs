//! Binary discovery and system checks

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::domain::error::DetectError;

const CAPTURE_NAME: &str = "SystemAudioDump";
const FFMPEG_NAME: &str = "ffmpeg";

/// Places a locally built SystemAudioDump usually ends up, relative to the
/// working directory
const CAPTURE_CANDIDATES: [&str; 3] = [
    "SystemAudioDump",
    ".build/release/SystemAudioDump",
    "externals/systemAudioDump/.build/release/SystemAudioDump",
];

const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// How long the capture binary gets to complain before we call it healthy
pub const PERMISSION_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

const PERMISSION_INDICATORS: [&str; 6] = [
    "screen recording",
    "permission",
    "privacy",
    "security",
    "access",
    "denied",
];

/// Any execute bit set on a regular file
pub fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Locate SystemAudioDump, preferring an explicit path
pub fn find_capture_binary(custom: Option<&Path>) -> Result<PathBuf, DetectError> {
    find_capture_binary_in(custom, Path::new("."))
}

fn find_capture_binary_in(custom: Option<&Path>, base: &Path) -> Result<PathBuf, DetectError> {
    if let Some(path) = custom {
        return check_explicit(CAPTURE_NAME, path);
    }

    CAPTURE_CANDIDATES
        .iter()
        .map(|candidate| base.join(candidate))
        .find(|candidate| is_executable(candidate))
        .ok_or(DetectError::CaptureNotDiscovered)
}

/// Locate ffmpeg, preferring an explicit path over `PATH`
pub fn find_ffmpeg(custom: Option<&Path>) -> Result<PathBuf, DetectError> {
    if let Some(path) = custom {
        return check_explicit(FFMPEG_NAME, path);
    }

    which::which(FFMPEG_NAME).map_err(|_| DetectError::FfmpegNotOnPath)
}

fn check_explicit(name: &'static str, path: &Path) -> Result<PathBuf, DetectError> {
    if !path.exists() {
        return Err(DetectError::NotFound {
            name,
            path: path.to_path_buf(),
        });
    }
    if !is_executable(path) {
        return Err(DetectError::NotExecutable {
            name,
            path: path.to_path_buf(),
        });
    }
    Ok(path.to_path_buf())
}

/// Run `ffmpeg -version`, require libmp3lame, and return the version line
pub async fn check_ffmpeg_version(ffmpeg: &Path) -> Result<String, DetectError> {
    let mut command = Command::new(ffmpeg);
    command
        .arg("-version")
        .stdin(Stdio::null())
        .kill_on_drop(true);

    let output = tokio::time::timeout(VERSION_CHECK_TIMEOUT, command.output())
        .await
        .map_err(|_| {
            DetectError::FfmpegUnusable(format!(
                "version check timed out after {}s",
                VERSION_CHECK_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| DetectError::FfmpegUnusable(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DetectError::FfmpegUnusable(stderr.trim().to_string()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("libmp3lame") {
        return Err(DetectError::Mp3EncoderMissing);
    }

    Ok(stdout
        .lines()
        .find(|line| line.starts_with("ffmpeg version"))
        .unwrap_or_default()
        .to_string())
}

/// Whether SystemAudioDump looks blocked by missing macOS permissions.
///
/// A binary that keeps streaming past the probe window is healthy and gets
/// killed. One that exits early is checked for permission complaints.
pub async fn detect_permission_issue(capture: &Path) -> bool {
    detect_permission_issue_within(capture, PERMISSION_PROBE_TIMEOUT).await
}

async fn detect_permission_issue_within(capture: &Path, window: Duration) -> bool {
    let mut command = Command::new(capture);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            debug!("Permission probe could not start {}: {}", CAPTURE_NAME, e);
            return true;
        }
    };

    // Dropping the timed-out future drops the child, which kills it
    let output = match tokio::time::timeout(window, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            debug!("Permission probe failed waiting on {}: {}", CAPTURE_NAME, e);
            return true;
        }
        Err(_) => {
            debug!("{} still streaming after probe window", CAPTURE_NAME);
            return false;
        }
    };

    let text = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
    .to_lowercase();

    mentions_permission_problem(&text)
}

fn mentions_permission_problem(lowercase_output: &str) -> bool {
    PERMISSION_INDICATORS
        .iter()
        .any(|indicator| lowercase_output.contains(indicator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn explicit_path_must_exist() {
        let err = find_capture_binary(Some(Path::new("/nonexistent/SystemAudioDump"))).unwrap_err();
        assert!(matches!(err, DetectError::NotFound { name: "SystemAudioDump", .. }));
    }

    #[test]
    fn explicit_path_must_be_executable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ffmpeg");
        fs::write(&path, "").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let err = find_ffmpeg(Some(&path)).unwrap_err();
        assert!(matches!(err, DetectError::NotExecutable { name: "ffmpeg", .. }));
    }

    #[test]
    fn directory_is_not_executable() {
        let dir = TempDir::new().unwrap();
        assert!(!is_executable(dir.path()));
    }

    #[test]
    fn discovers_first_executable_candidate() {
        let dir = TempDir::new().unwrap();
        let release = dir.path().join(".build/release");
        fs::create_dir_all(&release).unwrap();
        let expected = script(&release, "SystemAudioDump", "exit 0");

        let found = find_capture_binary_in(None, dir.path()).unwrap();
        assert_eq!(found, dir.path().join(".build/release/SystemAudioDump"));
        assert!(is_executable(&expected));
    }

    #[test]
    fn discovery_fails_without_candidates() {
        let dir = TempDir::new().unwrap();
        let err = find_capture_binary_in(None, dir.path()).unwrap_err();
        assert!(matches!(err, DetectError::CaptureNotDiscovered));
    }

    #[tokio::test]
    async fn version_check_returns_version_line() {
        let dir = TempDir::new().unwrap();
        let ffmpeg = script(
            dir.path(),
            "ffmpeg",
            "echo 'ffmpeg version 7.1 Copyright (c) the FFmpeg developers'\necho 'configuration: --enable-libmp3lame'",
        );

        let line = check_ffmpeg_version(&ffmpeg).await.unwrap();
        assert_eq!(line, "ffmpeg version 7.1 Copyright (c) the FFmpeg developers");
    }

    #[tokio::test]
    async fn version_check_requires_mp3_encoder() {
        let dir = TempDir::new().unwrap();
        let ffmpeg = script(dir.path(), "ffmpeg", "echo 'ffmpeg version 7.1'");

        let err = check_ffmpeg_version(&ffmpeg).await.unwrap_err();
        assert!(matches!(err, DetectError::Mp3EncoderMissing));
    }

    #[tokio::test]
    async fn version_check_reports_failing_binary() {
        let dir = TempDir::new().unwrap();
        let ffmpeg = script(dir.path(), "ffmpeg", "echo broken >&2; exit 1");

        let err = check_ffmpeg_version(&ffmpeg).await.unwrap_err();
        assert!(matches!(err, DetectError::FfmpegUnusable(ref msg) if msg == "broken"));
    }

    #[tokio::test]
    async fn permission_complaint_is_detected() {
        let dir = TempDir::new().unwrap();
        let capture = script(
            dir.path(),
            "SystemAudioDump",
            "echo 'Screen Recording permission denied' >&2; exit 1",
        );

        assert!(detect_permission_issue(&capture).await);
    }

    #[tokio::test]
    async fn quiet_exit_is_not_a_permission_issue() {
        let dir = TempDir::new().unwrap();
        let capture = script(dir.path(), "SystemAudioDump", "exit 0");

        assert!(!detect_permission_issue(&capture).await);
    }

    #[tokio::test]
    async fn streaming_capture_is_healthy() {
        let dir = TempDir::new().unwrap();
        let capture = script(dir.path(), "SystemAudioDump", "exec sleep 10");

        let issue =
            detect_permission_issue_within(&capture, Duration::from_millis(200)).await;
        assert!(!issue);
    }

    #[tokio::test]
    async fn unspawnable_capture_is_a_permission_issue() {
        assert!(detect_permission_issue(Path::new("/nonexistent/SystemAudioDump")).await);
    }

    #[test]
    fn indicators_match_case_folded_output() {
        assert!(mentions_permission_problem("error: access not granted"));
        assert!(!mentions_permission_problem("capturing at 24000 hz"));
    }
}

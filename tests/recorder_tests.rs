//! End-to-end session tests against script stand-ins

mod common;

use std::path::Path;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tempfile::TempDir;

use sli_recorder::application::ports::{LaunchError, ProcessRole};
use sli_recorder::application::{Recorder, RecordingError, RecordingErrorKind, StopSignal};
use sli_recorder::domain::config::{RecorderConfig, RecorderSettings};
use sli_recorder::domain::recording::{SessionState, StopReason};
use sli_recorder::infrastructure::PipelineLauncher;

use common::*;

fn config(dir: &Path, capture: &Path, encoder: &Path, max_seconds: u64) -> RecorderConfig {
    let outdir = dir.join("recordings");
    std::fs::create_dir_all(&outdir).unwrap();
    RecorderConfig::new(RecorderSettings {
        output_path: outdir.join("session.mp3"),
        outdir,
        bitrate: "160k".to_string(),
        max_seconds,
        dump_bin: capture.to_path_buf(),
        ffmpeg_bin: encoder.to_path_buf(),
        overwrite: false,
        verbose: true,
        title: None,
    })
    .unwrap()
}

/// Generous probe so slow CI still sees the scripted failures in time
fn patient_launcher() -> PipelineLauncher {
    PipelineLauncher::new().with_probe_window(Duration::from_millis(500))
}

fn is_gone(pid: i32) -> bool {
    matches!(kill(Pid::from_raw(pid), None::<Signal>), Err(Errno::ESRCH))
}

#[tokio::test]
async fn session_ends_at_max_seconds() {
    let dir = TempDir::new().unwrap();
    let capture = write_script(dir.path(), "SystemAudioDump", STREAMING_CAPTURE);
    let encoder = write_script(dir.path(), "ffmpeg", FAKE_FFMPEG);
    let config = config(dir.path(), &capture, &encoder, 2);

    let mut recorder = Recorder::new(&config, PipelineLauncher::new(), StopSignal::new());
    let started = Instant::now();
    recorder.start().await.unwrap();
    assert!(recorder.is_running());

    let code = tokio::time::timeout(Duration::from_secs(15), recorder.wait())
        .await
        .expect("session should end on its own")
        .unwrap();

    assert_eq!(code, 0);
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert_eq!(recorder.state(), SessionState::Finished);
    assert_eq!(recorder.stop_reason(), Some(StopReason::Completed));
    assert!(!recorder.is_running());

    let size = std::fs::metadata(config.output_path()).unwrap().len();
    assert!(size > 0);
}

#[tokio::test]
async fn external_stop_ends_session_as_user_requested() {
    let dir = TempDir::new().unwrap();
    let capture = write_script(dir.path(), "SystemAudioDump", STREAMING_CAPTURE);
    let encoder = write_script(dir.path(), "ffmpeg", FAKE_FFMPEG);
    let config = config(dir.path(), &capture, &encoder, 9000);

    let stop = StopSignal::new();
    let mut recorder = Recorder::new(&config, PipelineLauncher::new(), stop.clone());
    recorder.start().await.unwrap();

    let requester = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        stop.request();
    });

    let code = tokio::time::timeout(Duration::from_secs(15), recorder.wait())
        .await
        .expect("stop should end the session")
        .unwrap();
    requester.await.unwrap();

    assert_eq!(code, 0);
    assert_eq!(recorder.stop_reason(), Some(StopReason::UserRequested));
    assert!(std::fs::metadata(config.output_path()).unwrap().len() > 0);
}

#[tokio::test]
async fn start_then_immediate_stop_finishes_quickly() {
    let dir = TempDir::new().unwrap();
    let capture = write_script(dir.path(), "SystemAudioDump", STREAMING_CAPTURE);
    let encoder = write_script(dir.path(), "ffmpeg", FAKE_FFMPEG);
    let config = config(dir.path(), &capture, &encoder, 9000);

    let mut recorder = Recorder::new(&config, PipelineLauncher::new(), StopSignal::new());
    recorder.start().await.unwrap();
    recorder.stop_gracefully();
    recorder.stop_gracefully();

    let code = tokio::time::timeout(Duration::from_secs(10), recorder.wait())
        .await
        .expect("stop should end the session")
        .unwrap();

    assert_eq!(code, 0);
    assert!(config.output_path().exists());
}

#[tokio::test]
async fn failing_capture_is_a_startup_error() {
    let dir = TempDir::new().unwrap();
    let capture = write_script(dir.path(), "SystemAudioDump", DENIED_CAPTURE);
    let encoder = write_script(dir.path(), "ffmpeg", FAKE_FFMPEG);
    let config = config(dir.path(), &capture, &encoder, 60);

    let mut recorder = Recorder::new(&config, patient_launcher(), StopSignal::new());
    let err = recorder.start().await.unwrap_err();

    assert_eq!(err.kind(), RecordingErrorKind::Startup);
    match err {
        RecordingError::Startup(LaunchError::ExitedEarly { role, code, stderr }) => {
            assert_eq!(role, ProcessRole::Capture);
            assert_eq!(code, 3);
            assert!(stderr.contains("permission denied"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!config.output_path().exists());
    assert_eq!(recorder.state(), SessionState::NotStarted);
}

#[tokio::test]
async fn failing_encoder_cleans_up_capture() {
    let dir = TempDir::new().unwrap();
    let pid_file = dir.path().join("capture.pid");
    let capture = pid_reporting_capture(dir.path(), &pid_file);
    let encoder = write_script(dir.path(), "ffmpeg", FAILING_FFMPEG);
    let config = config(dir.path(), &capture, &encoder, 60);

    let mut recorder = Recorder::new(&config, patient_launcher(), StopSignal::new())
        .with_cleanup_timeout(Duration::from_secs(2));
    let err = recorder.start().await.unwrap_err();

    match err {
        RecordingError::Startup(LaunchError::ExitedEarly { role, stderr, .. }) => {
            assert_eq!(role, ProcessRole::Encoder);
            assert!(stderr.contains("Unknown encoder"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert!(is_gone(read_pid(&pid_file)), "capture process left running");
}

#[tokio::test]
async fn missing_capture_binary_is_a_startup_error() {
    let dir = TempDir::new().unwrap();
    let encoder = write_script(dir.path(), "ffmpeg", FAKE_FFMPEG);
    let config = config(dir.path(), &dir.path().join("absent"), &encoder, 60);

    let mut recorder = Recorder::new(&config, PipelineLauncher::new(), StopSignal::new());
    let err = recorder.start().await.unwrap_err();
    assert!(matches!(
        err,
        RecordingError::Startup(LaunchError::Spawn {
            role: ProcessRole::Capture,
            ..
        })
    ));
}

#[tokio::test]
async fn deleted_output_is_artifact_missing() {
    let dir = TempDir::new().unwrap();
    let capture = write_script(dir.path(), "SystemAudioDump", STREAMING_CAPTURE);
    // Writes the file, then an outside actor removes it before exit
    let encoder = write_script(
        dir.path(),
        "ffmpeg",
        r#"
for arg in "$@"; do out="$arg"; done
: > "$out"
sleep 0.5
rm -f "$out"
exit 0
"#,
    );
    let config = config(dir.path(), &capture, &encoder, 60);

    let mut recorder = Recorder::new(&config, PipelineLauncher::new(), StopSignal::new());
    recorder.start().await.unwrap();
    let err = tokio::time::timeout(Duration::from_secs(15), recorder.wait())
        .await
        .expect("session should end")
        .unwrap_err();

    assert_eq!(err.kind(), RecordingErrorKind::ArtifactMissing);
    assert!(matches!(err, RecordingError::OutputMissing(ref path) if path == config.output_path()));
}

#[tokio::test]
async fn wait_without_start_is_a_precondition_error() {
    let dir = TempDir::new().unwrap();
    let capture = write_script(dir.path(), "SystemAudioDump", STREAMING_CAPTURE);
    let encoder = write_script(dir.path(), "ffmpeg", FAKE_FFMPEG);
    let config = config(dir.path(), &capture, &encoder, 60);

    let mut recorder = Recorder::new(&config, PipelineLauncher::new(), StopSignal::new());
    let err = recorder.wait().await.unwrap_err();
    assert_eq!(err.kind(), RecordingErrorKind::Precondition);
    assert!(!config.output_path().exists());
}

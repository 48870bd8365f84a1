//! Recording session supervisor
//!
//! Owns the capture and encoder handles for one session: starts the pipeline,
//! waits for the encoder, reaps the capture process and checks the output.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::fs;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::config::RecorderConfig;
use crate::domain::recording::{format_elapsed, RecordingSession, SessionState, StopReason};

use super::ports::{
    LaunchError, ProcessError, ProcessHandle, ProcessLauncher, ProcessRole, ProcessSignal,
};
use super::report::log_process_result;
use super::status::StatusReporter;
use super::stop::StopSignal;

/// How long a terminated process gets before it is killed
pub const DEFAULT_CLEANUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Exit code of a writer killed by SIGPIPE
const BROKEN_PIPE_EXIT: i32 = 128 + 13;

/// Errors from a recording session
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("Failed to start recording: {0}")]
    Startup(#[source] LaunchError),

    #[error("Recording not started")]
    NotStarted,

    #[error("Recording already started")]
    AlreadyStarted,

    #[error("Recording already finished")]
    AlreadyFinished,

    #[error("Output file was not created: {}", .0.display())]
    OutputMissing(PathBuf),

    #[error("Recording failed: {0}")]
    Process(#[from] ProcessError),
}

/// Coarse classification of a [`RecordingError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingErrorKind {
    /// A process could not launch or died immediately
    Startup,
    /// Operations called out of order
    Precondition,
    /// The encoder exited but the output file is absent
    ArtifactMissing,
    /// A process handle failed mid-session
    Process,
}

impl RecordingError {
    pub fn kind(&self) -> RecordingErrorKind {
        match self {
            Self::Startup(_) => RecordingErrorKind::Startup,
            Self::NotStarted | Self::AlreadyStarted | Self::AlreadyFinished => {
                RecordingErrorKind::Precondition
            }
            Self::OutputMissing(_) => RecordingErrorKind::ArtifactMissing,
            Self::Process(_) => RecordingErrorKind::Process,
        }
    }
}

enum EncoderEvent {
    Exited(Result<Option<i32>, ProcessError>),
    StopRequested,
}

/// Session supervisor for the capture → encoder pipeline
pub struct Recorder<'a, L: ProcessLauncher> {
    config: &'a RecorderConfig,
    launcher: L,
    stop: StopSignal,
    session: RecordingSession,
    capture: Option<Box<dyn ProcessHandle>>,
    encoder: Option<Box<dyn ProcessHandle>>,
    started_at: Option<Instant>,
    encoder_alive: Arc<AtomicBool>,
    reporter: Option<StatusReporter>,
    interrupt_attempted: bool,
    cleanup_timeout: Duration,
}

impl<'a, L: ProcessLauncher> Recorder<'a, L> {
    /// Create a recorder.
    ///
    /// `stop` is the caller's stop primitive; requesting it has the same
    /// effect as [`Recorder::stop_gracefully`] while `wait` is running.
    pub fn new(config: &'a RecorderConfig, launcher: L, stop: StopSignal) -> Self {
        Self {
            config,
            launcher,
            stop,
            session: RecordingSession::new(),
            capture: None,
            encoder: None,
            started_at: None,
            encoder_alive: Arc::new(AtomicBool::new(false)),
            reporter: None,
            interrupt_attempted: false,
            cleanup_timeout: DEFAULT_CLEANUP_TIMEOUT,
        }
    }

    /// Override the terminate-then-kill grace period
    pub fn with_cleanup_timeout(mut self, timeout: Duration) -> Self {
        self.cleanup_timeout = timeout;
        self
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Why the session ended, once it has
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.session
            .is_finished()
            .then(|| self.session.stop_reason())
    }

    /// Time since the pipeline started, zero before start
    pub fn elapsed(&self) -> Duration {
        self.started_at
            .map(|started| started.elapsed())
            .unwrap_or_default()
    }

    /// Launch both processes.
    ///
    /// Anything partially started is torn down before the error is returned.
    pub async fn start(&mut self) -> Result<(), RecordingError> {
        if !self.session.is_not_started() {
            return Err(RecordingError::AlreadyStarted);
        }

        info!(
            "Starting recording to: {}",
            self.config.output_path().display()
        );
        info!(
            "Recording will auto-stop after {} seconds ({:.1} hours)",
            self.config.max_seconds(),
            self.config.max_hours()
        );
        info!("Press Ctrl+C to stop recording early");

        let pair = match self.launcher.launch(self.config).await {
            Ok(pair) => pair,
            Err(failure) => {
                for (role, mut handle) in failure.started {
                    shutdown_process(role, handle.as_mut(), self.cleanup_timeout).await;
                }
                return Err(RecordingError::Startup(failure.error));
            }
        };

        self.capture = Some(pair.capture);
        self.encoder = Some(pair.encoder);
        self.session
            .start()
            .map_err(|_| RecordingError::AlreadyStarted)?;

        let started_at = Instant::now();
        self.started_at = Some(started_at);
        self.encoder_alive.store(true, Ordering::SeqCst);

        if !self.config.verbose() {
            self.reporter = Some(StatusReporter::spawn(
                started_at,
                Arc::clone(&self.encoder_alive),
                self.stop.clone(),
            ));
        }

        Ok(())
    }

    /// Wait for the encoder to exit, reap the capture process and verify
    /// the output file.
    ///
    /// # Returns
    /// The encoder's exit code
    pub async fn wait(&mut self) -> Result<i32, RecordingError> {
        if self.session.is_finished() {
            return Err(RecordingError::AlreadyFinished);
        }
        if self.encoder.is_none() || !self.session.is_active() {
            return Err(RecordingError::NotStarted);
        }

        let result = self.supervise().await;

        self.stop_reporter().await;
        if result.is_err() {
            self.cleanup_processes().await;
        }

        result
    }

    /// Request a graceful stop.
    ///
    /// Sends the encoder a single interrupt so it can finalize the file.
    /// Repeated calls have no further effect.
    pub fn stop_gracefully(&mut self) {
        self.stop.request();
        self.session.request_stop();

        if self.interrupt_attempted {
            return;
        }
        let Some(encoder) = self.encoder.as_mut() else {
            return;
        };

        let exited = match encoder.exit_code() {
            Ok(code) => code.is_some(),
            Err(e) => {
                debug!("{}", e);
                false
            }
        };
        if !exited {
            debug!("Sending SIGINT to ffmpeg for graceful shutdown");
            if let Err(e) = encoder.send_signal(ProcessSignal::Interrupt) {
                warn!("{}", e);
            }
        }
        self.interrupt_attempted = true;
    }

    /// Check if the encoder is alive
    pub fn is_running(&mut self) -> bool {
        self.encoder
            .as_mut()
            .is_some_and(|encoder| matches!(encoder.exit_code(), Ok(None)))
    }

    async fn supervise(&mut self) -> Result<i32, RecordingError> {
        let encoder_code = self.wait_for_encoder().await?;
        self.encoder_alive.store(false, Ordering::SeqCst);
        self.stop_reporter().await;

        // The encoder may exit before the stop arm of the select is polled
        if self.stop.is_requested() {
            self.session.request_stop();
        }
        let reason = self
            .session
            .finish()
            .map_err(|_| RecordingError::NotStarted)?;

        self.reap_capture().await;

        let encoder_stderr = self.encoder.as_ref().and_then(|e| e.stderr_output());
        log_process_result(ProcessRole::Encoder, encoder_code, encoder_stderr.as_deref());

        let elapsed = format_elapsed(self.elapsed().as_secs());
        match reason {
            StopReason::UserRequested => info!("Recording stopped by user after {}", elapsed),
            StopReason::Completed => info!("Recording completed after {}", elapsed),
        }

        let output_path = self.config.output_path();
        let file_size = match fs::metadata(output_path).await {
            Ok(metadata) if metadata.is_file() => metadata.len(),
            _ => return Err(RecordingError::OutputMissing(output_path.to_path_buf())),
        };

        if file_size == 0 {
            warn!("Output file is empty: {}", output_path.display());
        }
        info!("Saved {} bytes to: {}", file_size, output_path.display());

        Ok(encoder_code)
    }

    async fn wait_for_encoder(&mut self) -> Result<i32, RecordingError> {
        loop {
            let encoder = self.encoder.as_mut().ok_or(RecordingError::NotStarted)?;

            let event = tokio::select! {
                result = encoder.wait(None) => EncoderEvent::Exited(result),
                () = self.stop.requested(), if !self.interrupt_attempted => {
                    EncoderEvent::StopRequested
                }
            };

            match event {
                EncoderEvent::Exited(Ok(Some(code))) => return Ok(code),
                EncoderEvent::Exited(Ok(None)) => continue,
                EncoderEvent::Exited(Err(e)) => return Err(e.into()),
                EncoderEvent::StopRequested => self.stop_gracefully(),
            }
        }
    }

    async fn reap_capture(&mut self) {
        let timeout = self.cleanup_timeout;
        let Some(capture) = self.capture.as_mut() else {
            return;
        };

        match capture.exit_code() {
            // The encoder closed the pipe when it hit its duration cap
            Ok(Some(BROKEN_PIPE_EXIT)) => {
                debug!("{} stopped after its reader closed", ProcessRole::Capture)
            }
            Ok(Some(code)) => {
                let stderr = capture.stderr_output();
                log_process_result(ProcessRole::Capture, code, stderr.as_deref());
            }
            Ok(None) | Err(_) => {
                match shutdown_process(ProcessRole::Capture, capture.as_mut(), timeout).await {
                    Some(code) => debug!("{} stopped (exit code {})", ProcessRole::Capture, code),
                    None => debug!("{} exit status unknown", ProcessRole::Capture),
                }
            }
        }
    }

    async fn stop_reporter(&mut self) {
        if let Some(reporter) = self.reporter.take() {
            reporter.shutdown().await;
        }
    }

    async fn cleanup_processes(&mut self) {
        let timeout = self.cleanup_timeout;
        if let Some(encoder) = self.encoder.as_mut() {
            shutdown_process(ProcessRole::Encoder, encoder.as_mut(), timeout).await;
        }
        if let Some(capture) = self.capture.as_mut() {
            shutdown_process(ProcessRole::Capture, capture.as_mut(), timeout).await;
        }
        self.encoder_alive.store(false, Ordering::SeqCst);
    }
}

/// Terminate a process, escalating to a kill after `timeout`.
///
/// Handle errors are logged and swallowed. Returns the exit code when known.
async fn shutdown_process(
    role: ProcessRole,
    handle: &mut dyn ProcessHandle,
    timeout: Duration,
) -> Option<i32> {
    match handle.exit_code() {
        Ok(Some(code)) => return Some(code),
        Ok(None) => {}
        Err(e) => debug!("{}", e),
    }

    debug!("Terminating {}", role);
    if let Err(e) = handle.send_signal(ProcessSignal::Terminate) {
        debug!("{}", e);
    }

    match handle.wait(Some(timeout)).await {
        Ok(Some(code)) => return Some(code),
        Ok(None) => debug!("{} did not terminate gracefully, killing", role),
        Err(e) => debug!("{}", e),
    }

    if let Err(e) = handle.kill().await {
        debug!("{}", e);
    }

    match handle.wait(None).await {
        Ok(code) => code,
        Err(e) => {
            debug!("{}", e);
            None
        }
    }
}

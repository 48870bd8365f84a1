//! Process port interfaces

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::config::RecorderConfig;

/// Errors raised by a process handle
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    #[error("Failed to signal {role}: {message}")]
    Signal { role: ProcessRole, message: String },

    #[error("Failed to wait for {role}: {message}")]
    Wait { role: ProcessRole, message: String },

    #[error("Failed to kill {role}: {message}")]
    Kill { role: ProcessRole, message: String },
}

/// Errors raised while launching the process pair
#[derive(Debug, Clone, Error)]
pub enum LaunchError {
    #[error("{role} could not be spawned: {message}")]
    Spawn { role: ProcessRole, message: String },

    #[error("{role} failed to start (exit code {code}): {stderr}")]
    ExitedEarly {
        role: ProcessRole,
        code: i32,
        stderr: String,
    },

    #[error("{role} output stream is not available")]
    MissingStream { role: ProcessRole },

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// The two processes of a recording pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessRole {
    /// Raw PCM producer
    Capture,
    /// MP3 encoder reading the capture stream
    Encoder,
}

impl ProcessRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Capture => "SystemAudioDump",
            Self::Encoder => "ffmpeg",
        }
    }
}

impl fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Non-forceful signals a handle can deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessSignal {
    /// Ask the process to finish up (Ctrl+C semantics)
    Interrupt,
    /// Ask the process to terminate
    Terminate,
}

/// Handle to a running OS process.
///
/// Exit codes of processes killed by a signal are reported as
/// `128 + signal number`.
#[async_trait]
pub trait ProcessHandle: Send {
    /// Deliver a signal. A process that already exited is not an error.
    fn send_signal(&mut self, signal: ProcessSignal) -> Result<(), ProcessError>;

    /// Forcefully kill the process without waiting for it.
    async fn kill(&mut self) -> Result<(), ProcessError>;

    /// Wait for the process to exit.
    ///
    /// With a timeout, returns `Ok(None)` if the process is still alive when
    /// it elapses. Without one, waits indefinitely.
    async fn wait(&mut self, timeout: Option<Duration>) -> Result<Option<i32>, ProcessError>;

    /// Exit code if the process has exited, `None` while it is alive.
    fn exit_code(&mut self) -> Result<Option<i32>, ProcessError>;

    /// Captured standard error collected so far, if the handle keeps it.
    fn stderr_output(&self) -> Option<String> {
        None
    }
}

/// Both processes of a successfully launched pipeline
pub struct ProcessPair {
    pub capture: Box<dyn ProcessHandle>,
    pub encoder: Box<dyn ProcessHandle>,
}

/// A failed launch, with any processes started before the failure.
///
/// The caller owns cleanup of `started`.
pub struct LaunchFailure {
    pub error: LaunchError,
    pub started: Vec<(ProcessRole, Box<dyn ProcessHandle>)>,
}

impl LaunchFailure {
    /// Failure before any process was left behind
    pub fn new(error: LaunchError) -> Self {
        Self {
            error,
            started: Vec::new(),
        }
    }

    /// Attach a partially started process
    pub fn with_started(mut self, role: ProcessRole, handle: Box<dyn ProcessHandle>) -> Self {
        self.started.push((role, handle));
        self
    }
}

impl fmt::Debug for LaunchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchFailure")
            .field("error", &self.error)
            .field(
                "started",
                &self.started.iter().map(|(role, _)| role).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Port for starting the capture → encoder pipeline
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Launch the capture process, then the encoder reading its output.
    ///
    /// # Returns
    /// Both handles, or the failure plus whatever was already started
    async fn launch(&self, config: &RecorderConfig) -> Result<ProcessPair, LaunchFailure>;
}

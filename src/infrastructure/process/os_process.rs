//! OS process handle backed by `tokio::process`

use std::process::ExitStatus;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::io::{self, AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::application::ports::{LaunchError, ProcessError, ProcessHandle, ProcessRole, ProcessSignal};

/// Upper bound on retained stderr; older bytes are dropped first
const STDERR_LIMIT: usize = 64 * 1024;

/// A spawned child process.
///
/// Stderr (when piped) is drained in the background so a chatty process can
/// never block on a full pipe.
pub struct OsProcess {
    role: ProcessRole,
    child: Child,
    exit: Option<i32>,
    stderr: Arc<Mutex<Vec<u8>>>,
    stderr_drain: Option<JoinHandle<()>>,
}

impl OsProcess {
    /// Spawn a configured command
    pub fn spawn(role: ProcessRole, command: &mut Command) -> Result<Self, LaunchError> {
        let mut child = command.spawn().map_err(|e| LaunchError::Spawn {
            role,
            message: e.to_string(),
        })?;

        let stderr = Arc::new(Mutex::new(Vec::new()));
        let stderr_drain = child
            .stderr
            .take()
            .map(|pipe| spawn_drain(pipe, Some(Arc::clone(&stderr))));

        Ok(Self {
            role,
            child,
            exit: None,
            stderr,
            stderr_drain,
        })
    }

    pub fn role(&self) -> ProcessRole {
        self.role
    }

    /// Take the piped stdout, leaving it to the caller
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Read and throw away the piped stdout, if any
    pub fn discard_stdout(&mut self) {
        if let Some(stdout) = self.child.stdout.take() {
            spawn_drain(stdout, None);
        }
    }

    /// Wait up to `grace` for stderr to reach EOF, then return it as text
    pub async fn collect_stderr(&mut self, grace: Duration) -> String {
        if let Some(drain) = self.stderr_drain.take() {
            let _ = tokio::time::timeout(grace, drain).await;
        }
        self.stderr_text().trim().to_string()
    }

    fn stderr_text(&self) -> String {
        let buffer = self.stderr.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buffer).into_owned()
    }

    fn record_exit(&mut self, status: ExitStatus) -> i32 {
        let code = exit_code_of(status);
        self.exit = Some(code);
        code
    }
}

#[async_trait]
impl ProcessHandle for OsProcess {
    fn send_signal(&mut self, signal: ProcessSignal) -> Result<(), ProcessError> {
        if self.exit.is_some() {
            return Ok(());
        }
        let Some(id) = self.child.id() else {
            return Ok(());
        };

        let sig = match signal {
            ProcessSignal::Interrupt => Signal::SIGINT,
            ProcessSignal::Terminate => Signal::SIGTERM,
        };

        match signal::kill(Pid::from_raw(id as i32), sig) {
            // ESRCH: exited but not yet reaped
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(ProcessError::Signal {
                role: self.role,
                message: e.to_string(),
            }),
        }
    }

    async fn kill(&mut self) -> Result<(), ProcessError> {
        if self.exit.is_some() {
            return Ok(());
        }
        match self.child.start_kill() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(ProcessError::Kill {
                role: self.role,
                message: e.to_string(),
            }),
        }
    }

    async fn wait(&mut self, timeout: Option<Duration>) -> Result<Option<i32>, ProcessError> {
        if let Some(code) = self.exit {
            return Ok(Some(code));
        }

        let status = match timeout {
            Some(limit) => match tokio::time::timeout(limit, self.child.wait()).await {
                Ok(status) => status,
                Err(_) => return Ok(None),
            },
            None => self.child.wait().await,
        };

        let status = status.map_err(|e| ProcessError::Wait {
            role: self.role,
            message: e.to_string(),
        })?;
        Ok(Some(self.record_exit(status)))
    }

    fn exit_code(&mut self) -> Result<Option<i32>, ProcessError> {
        if let Some(code) = self.exit {
            return Ok(Some(code));
        }

        match self.child.try_wait() {
            Ok(Some(status)) => Ok(Some(self.record_exit(status))),
            Ok(None) => Ok(None),
            Err(e) => Err(ProcessError::Wait {
                role: self.role,
                message: e.to_string(),
            }),
        }
    }

    fn stderr_output(&self) -> Option<String> {
        let text = self.stderr_text();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Exit code, or `128 + signal` for a signalled process
pub fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    if let Some(code) = status.code() {
        return code;
    }
    status.signal().map(|sig| 128 + sig).unwrap_or(-1)
}

fn spawn_drain<R>(mut reader: R, sink: Option<Arc<Mutex<Vec<u8>>>>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(sink) = sink else {
            let _ = io::copy(&mut reader, &mut io::sink()).await;
            return;
        };

        let mut chunk = [0u8; 4096];
        loop {
            let n = match reader.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };

            let mut buffer = sink.lock().unwrap_or_else(|e| e.into_inner());
            buffer.extend_from_slice(&chunk[..n]);
            if buffer.len() > STDERR_LIMIT {
                let excess = buffer.len() - STDERR_LIMIT;
                buffer.drain(..excess);
            }
        }
    })
}

//! Recording session state machine

use std::fmt;
use thiserror::Error;

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    NotStarted,
    Running,
    StopRequested,
    Finished,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::Running => "running",
            Self::StopRequested => "stop requested",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: String,
}

/// Why a finished session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A graceful stop was requested before the encoder exited
    UserRequested,
    /// The encoder exited on its own (duration cap or error)
    Completed,
}

/// Recording session entity.
///
/// State machine:
///   NOT_STARTED -> RUNNING (start)
///   RUNNING -> STOP_REQUESTED (request_stop)
///   RUNNING | STOP_REQUESTED -> FINISHED (finish)
///
/// Requesting a stop is monotonic: once requested, the session remembers it
/// even after finishing.
#[derive(Debug, Default)]
pub struct RecordingSession {
    state: SessionState,
    stop_requested: bool,
}

impl RecordingSession {
    /// Create a new session that has not started yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_not_started(&self) -> bool {
        self.state == SessionState::NotStarted
    }

    /// Check if the processes are live (running or winding down)
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            SessionState::Running | SessionState::StopRequested
        )
    }

    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    /// Whether a graceful stop has ever been requested
    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Transition from NOT_STARTED to RUNNING
    pub fn start(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != SessionState::NotStarted {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "start recording".to_string(),
            });
        }
        self.state = SessionState::Running;
        Ok(())
    }

    /// Transition from RUNNING to STOP_REQUESTED.
    ///
    /// Returns `true` only for the call that performed the transition;
    /// repeated requests and requests outside a live session are no-ops.
    pub fn request_stop(&mut self) -> bool {
        if self.state != SessionState::Running {
            return false;
        }
        self.state = SessionState::StopRequested;
        self.stop_requested = true;
        true
    }

    /// Transition from RUNNING or STOP_REQUESTED to FINISHED
    pub fn finish(&mut self) -> Result<StopReason, InvalidStateTransition> {
        if !self.is_active() {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "finish recording".to_string(),
            });
        }
        self.state = SessionState::Finished;
        Ok(self.stop_reason())
    }

    /// Stop reason derived from whether a stop was requested
    pub fn stop_reason(&self) -> StopReason {
        if self.stop_requested {
            StopReason::UserRequested
        } else {
            StopReason::Completed
        }
    }
}

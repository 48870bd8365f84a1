//! Recording session domain

mod elapsed;
mod filename;
mod session;

pub use elapsed::{format_elapsed, is_status_tick, STATUS_INTERVAL_SECS};
pub use filename::{build_output_filename, sanitize_title, OUTPUT_EXTENSION};
pub use session::{InvalidStateTransition, RecordingSession, SessionState, StopReason};

//! Application layer - Use cases and port interfaces
//!
//! Contains the session supervisor and trait definitions
//! for external system interactions.

pub mod ports;
pub mod recorder;
pub mod report;
pub mod status;
pub mod stop;

// Re-export use cases
pub use recorder::{Recorder, RecordingError, RecordingErrorKind, DEFAULT_CLEANUP_TIMEOUT};
pub use status::StatusReporter;
pub use stop::StopSignal;

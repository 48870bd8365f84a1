//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod config;
pub mod process;

// Re-export common types
pub use config::ConfigStore;
pub use process::{
    LaunchError, LaunchFailure, ProcessError, ProcessHandle, ProcessLauncher, ProcessPair,
    ProcessRole, ProcessSignal,
};

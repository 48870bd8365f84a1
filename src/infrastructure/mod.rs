//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with SystemAudioDump, ffmpeg and the filesystem.

pub mod config;
pub mod detect;
pub mod output;
pub mod process;

// Re-export adapters
pub use config::XdgConfigStore;
pub use process::{OsProcess, PipelineLauncher};

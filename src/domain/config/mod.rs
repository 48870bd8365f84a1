//! Configuration value objects

mod file_config;
mod recorder_config;

pub use file_config::{FileConfig, DEFAULT_BITRATE, DEFAULT_MAX_SECONDS, DEFAULT_OUTDIR};
pub use recorder_config::{RecorderConfig, RecorderSettings};

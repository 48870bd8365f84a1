//! Recorder configuration value object

use std::path::{Path, PathBuf};

use crate::domain::error::ConfigError;

/// Durations below this many seconds are accepted but worth a warning
const SHORT_DURATION_SECS: u64 = 10;

/// Raw inputs for a [`RecorderConfig`], resolved by the caller.
#[derive(Debug, Clone)]
pub struct RecorderSettings {
    pub outdir: PathBuf,
    pub bitrate: String,
    pub max_seconds: u64,
    pub dump_bin: PathBuf,
    pub ffmpeg_bin: PathBuf,
    pub overwrite: bool,
    pub verbose: bool,
    pub title: Option<String>,
    pub output_path: PathBuf,
}

/// Immutable configuration for one recording session.
///
/// Executable paths are expected to have been validated by the binary
/// detection step before this is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderConfig {
    outdir: PathBuf,
    bitrate: String,
    max_seconds: u64,
    dump_bin: PathBuf,
    ffmpeg_bin: PathBuf,
    overwrite: bool,
    verbose: bool,
    title: Option<String>,
    output_path: PathBuf,
}

impl RecorderConfig {
    /// Validate settings and build the configuration
    pub fn new(settings: RecorderSettings) -> Result<Self, ConfigError> {
        if settings.max_seconds == 0 {
            return Err(ConfigError::ValidationError {
                key: "max_seconds".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if settings.bitrate.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                key: "bitrate".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(Self {
            outdir: settings.outdir,
            bitrate: settings.bitrate,
            max_seconds: settings.max_seconds,
            dump_bin: settings.dump_bin,
            ffmpeg_bin: settings.ffmpeg_bin,
            overwrite: settings.overwrite,
            verbose: settings.verbose,
            title: settings.title,
            output_path: settings.output_path,
        })
    }

    pub fn outdir(&self) -> &Path {
        &self.outdir
    }

    pub fn bitrate(&self) -> &str {
        &self.bitrate
    }

    pub fn max_seconds(&self) -> u64 {
        self.max_seconds
    }

    /// Max duration expressed in hours
    pub fn max_hours(&self) -> f64 {
        self.max_seconds as f64 / 3600.0
    }

    /// Whether the max duration is short enough to deserve a warning
    pub fn is_short_duration(&self) -> bool {
        self.max_seconds < SHORT_DURATION_SECS
    }

    pub fn dump_bin(&self) -> &Path {
        &self.dump_bin
    }

    pub fn ffmpeg_bin(&self) -> &Path {
        &self.ffmpeg_bin
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Final resolved path of the MP3 file
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

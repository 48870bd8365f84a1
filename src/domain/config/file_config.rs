//! Layered file configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default output directory
pub const DEFAULT_OUTDIR: &str = "./recordings";

/// Default MP3 bitrate
pub const DEFAULT_BITRATE: &str = "160k";

/// Default hard cap (2.5 hours)
pub const DEFAULT_MAX_SECONDS: u64 = 9000;

/// Recorder defaults as read from a config file.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    pub outdir: Option<PathBuf>,
    pub bitrate: Option<String>,
    pub max_seconds: Option<u64>,
    pub dump_bin: Option<PathBuf>,
    pub ffmpeg_bin: Option<PathBuf>,
}

impl FileConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            outdir: Some(PathBuf::from(DEFAULT_OUTDIR)),
            bitrate: Some(DEFAULT_BITRATE.to_string()),
            max_seconds: Some(DEFAULT_MAX_SECONDS),
            dump_bin: None,
            ffmpeg_bin: None,
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            outdir: other.outdir.or(self.outdir),
            bitrate: other.bitrate.or(self.bitrate),
            max_seconds: other.max_seconds.or(self.max_seconds),
            dump_bin: other.dump_bin.or(self.dump_bin),
            ffmpeg_bin: other.ffmpeg_bin.or(self.ffmpeg_bin),
        }
    }

    pub fn outdir_or_default(&self) -> PathBuf {
        self.outdir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTDIR))
    }

    pub fn bitrate_or_default(&self) -> String {
        self.bitrate
            .clone()
            .unwrap_or_else(|| DEFAULT_BITRATE.to_string())
    }

    pub fn max_seconds_or_default(&self) -> u64 {
        self.max_seconds.unwrap_or(DEFAULT_MAX_SECONDS)
    }
}

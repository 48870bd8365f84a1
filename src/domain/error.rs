//! Domain error types

use std::path::PathBuf;

use thiserror::Error;

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },
}

/// Error when a required binary cannot be located or used
#[derive(Debug, Clone, Error)]
pub enum DetectError {
    #[error("{name} not found at: {}", path.display())]
    NotFound { name: &'static str, path: PathBuf },

    #[error("{name} is not executable: {}", path.display())]
    NotExecutable { name: &'static str, path: PathBuf },

    #[error("SystemAudioDump binary not found. Please specify path with --dump-bin or build it using: swift build -c release")]
    CaptureNotDiscovered,

    #[error("ffmpeg not found on PATH. Install with: brew install ffmpeg or specify path with --ffmpeg-bin")]
    FfmpegNotOnPath,

    #[error("ffmpeg failed to run: {0}")]
    FfmpegUnusable(String),

    #[error("ffmpeg found but libmp3lame codec not available. Install ffmpeg with: brew install ffmpeg")]
    Mp3EncoderMissing,

    #[error("macOS requires Screen Recording permission for system audio. Grant access for your terminal in System Settings → Privacy & Security → Screen Recording, then re-run.")]
    PermissionDenied,
}

/// Error when preparing the output location
#[derive(Debug, Clone, Error)]
pub enum OutputPathError {
    #[error("Output file already exists: {}. Use --overwrite to replace it.", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Failed to create output directory {}: {message}", path.display())]
    CreateDir { path: PathBuf, message: String },
}

//! SLI Recorder - record macOS system audio to MP3
//!
//! This crate supervises a two-process pipeline: SystemAudioDump streams raw
//! PCM into ffmpeg, which encodes it to an MP3 file.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Configuration, session state, filenames, and errors
//! - **Application**: The session supervisor and port interfaces (traits)
//! - **Infrastructure**: OS process adapters, binary detection, config file
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::Parser;

/// Record macOS system audio to MP3 using SystemAudioDump and ffmpeg.
///
/// Stops when you press Ctrl+C or after the max-seconds cap.
#[derive(Parser, Debug)]
#[command(name = "sli-recorder")]
#[command(version)]
#[command(about = "Record macOS system audio to MP3 using SystemAudioDump and ffmpeg")]
#[command(after_help = "Examples:\n  sli-recorder \"focus-music\"\n  sli-recorder --bitrate 128k --max-seconds 3600\n  sli-recorder --dump-bin ./SystemAudioDump --verbose")]
pub struct Cli {
    /// Optional title for the recording
    #[arg(value_name = "TITLE")]
    pub title: Option<String>,

    /// Output directory for recordings [default: ./recordings]
    #[arg(long, value_name = "DIR")]
    pub outdir: Option<PathBuf>,

    /// MP3 bitrate (e.g. 128k, 160k) [default: 160k]
    #[arg(long, value_name = "RATE")]
    pub bitrate: Option<String>,

    /// Hard cap in seconds [default: 9000 = 2.5h]
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_seconds: Option<u64>,

    /// Path to SystemAudioDump binary (autodetect if not specified)
    #[arg(long, value_name = "PATH", env = "SLI_RECORDER_DUMP_BIN")]
    pub dump_bin: Option<PathBuf>,

    /// Path to ffmpeg binary (default: ffmpeg on PATH)
    #[arg(long, value_name = "PATH", env = "SLI_RECORDER_FFMPEG_BIN")]
    pub ffmpeg_bin: Option<PathBuf>,

    /// Overwrite output if it exists
    #[arg(long)]
    pub overwrite: bool,

    /// Show detailed logs
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Print resolved commands without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Config file to use instead of the XDG default
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

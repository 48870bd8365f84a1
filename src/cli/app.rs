//! Main app runner

use std::process::ExitCode;

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use crate::application::ports::ConfigStore;
use crate::application::report::format_command;
use crate::application::{Recorder, RecordingError, StopSignal};
use crate::domain::config::{FileConfig, RecorderConfig, RecorderSettings};
use crate::domain::error::{ConfigError, DetectError, OutputPathError};
use crate::domain::recording::{build_output_filename, StopReason};
use crate::infrastructure::detect::{
    check_ffmpeg_version, detect_permission_issue, find_capture_binary, find_ffmpeg,
};
use crate::infrastructure::output::{check_output_file, ensure_output_dir};
use crate::infrastructure::process::build_encoder_args;
use crate::infrastructure::{PipelineLauncher, XdgConfigStore};

use super::args::Cli;
use super::logging::init_logging;
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// What ffmpeg exits with after finishing due to SIGINT
pub const ENCODER_INTERRUPTED_EXIT: i32 = 255;

/// Anything that ends a run before or during the session
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error(transparent)]
    Output(#[from] OutputPathError),

    #[error(transparent)]
    Recording(#[from] RecordingError),

    #[error("Failed to setup signal handler: {0}")]
    Signals(#[from] std::io::Error),
}

/// Run the recorder for parsed arguments
pub async fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);
    let presenter = Presenter::new();

    match execute(cli, &presenter).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn execute(cli: Cli, presenter: &Presenter) -> Result<u8, RunError> {
    let merged = load_merged_config(&cli).await?;

    let dump_bin = find_capture_binary(merged.dump_bin.as_deref())?;
    let ffmpeg_bin = find_ffmpeg(merged.ffmpeg_bin.as_deref())?;
    let version = check_ffmpeg_version(&ffmpeg_bin).await?;
    debug!("Found {}", version);

    if detect_permission_issue(&dump_bin).await {
        return Err(DetectError::PermissionDenied.into());
    }

    let outdir = merged.outdir_or_default();
    ensure_output_dir(&outdir)?;
    let output_path = outdir.join(build_output_filename(cli.title.as_deref(), Utc::now()));
    check_output_file(&output_path, cli.overwrite)?;

    let config = RecorderConfig::new(RecorderSettings {
        outdir,
        bitrate: merged.bitrate_or_default(),
        max_seconds: merged.max_seconds_or_default(),
        dump_bin,
        ffmpeg_bin,
        overwrite: cli.overwrite,
        verbose: cli.verbose,
        title: cli.title,
        output_path,
    })?;

    if config.is_short_duration() {
        presenter.warn(&format!(
            "Max duration is very short ({} seconds)",
            config.max_seconds()
        ));
    }

    if cli.dry_run {
        print_dry_run(&config, presenter);
        return Ok(EXIT_SUCCESS);
    }

    let stop = StopSignal::new();
    let _bridge = ShutdownSignal::install(stop.clone())?;

    let mut recorder = Recorder::new(&config, PipelineLauncher::new(), stop);
    recorder.start().await?;
    let code = recorder.wait().await?;

    let exit = session_exit_code(code, recorder.stop_reason());
    if exit != EXIT_SUCCESS {
        presenter.error(&format!("Recording failed with exit code {}", code));
    } else {
        presenter.success(&format!("Saved {}", config.output_path().display()));
    }
    Ok(exit)
}

/// Load and merge configuration: defaults < file < env/CLI
pub async fn load_merged_config(cli: &Cli) -> Result<FileConfig, ConfigError> {
    let store = match &cli.config {
        Some(path) => XdgConfigStore::with_path(path),
        None => XdgConfigStore::new(),
    };
    debug!("Loading config from {}", store.path().display());
    let file_config = store.load().await?;

    // Env vars for the binaries arrive through clap
    let cli_config = FileConfig {
        outdir: cli.outdir.clone(),
        bitrate: cli.bitrate.clone(),
        max_seconds: cli.max_seconds,
        dump_bin: cli.dump_bin.clone(),
        ffmpeg_bin: cli.ffmpeg_bin.clone(),
    };

    Ok(FileConfig::defaults().merge(file_config).merge(cli_config))
}

/// Map the encoder's exit code to the process exit code.
///
/// ffmpeg reports 255 when it finished because of our SIGINT; that is a
/// normal end for a user-requested stop.
pub fn session_exit_code(code: i32, reason: Option<StopReason>) -> u8 {
    if code == 0 {
        return EXIT_SUCCESS;
    }
    if code == ENCODER_INTERRUPTED_EXIT && reason == Some(StopReason::UserRequested) {
        debug!("ffmpeg exited with {} after interrupt", code);
        return EXIT_SUCCESS;
    }
    code.clamp(1, 255) as u8
}

fn print_dry_run(config: &RecorderConfig, presenter: &Presenter) {
    let ffmpeg_command = format_command(config.ffmpeg_bin(), build_encoder_args(config));
    let dump_command = config.dump_bin().display();

    presenter.output("Dry run mode - commands that would be executed:");
    presenter.output("");
    presenter.output(&format!("Output file: {}", config.output_path().display()));
    presenter.output(&format!(
        "Max duration: {} seconds ({:.1} hours)",
        config.max_seconds(),
        config.max_hours()
    ));
    presenter.output("");
    presenter.output("SystemAudioDump command:");
    presenter.output(&format!("  {}", dump_command));
    presenter.output("");
    presenter.output("ffmpeg command:");
    presenter.output(&format!("  {}", ffmpeg_command));
    presenter.output("");
    presenter.output("Pipeline:");
    presenter.output(&format!("  {} | {}", dump_command, ffmpeg_command));
}

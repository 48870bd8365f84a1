//! Capture-to-encoder pipeline launcher

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::application::ports::{
    LaunchError, LaunchFailure, ProcessHandle, ProcessLauncher, ProcessPair, ProcessRole,
};
use crate::application::report::log_command;
use crate::domain::config::RecorderConfig;

use super::os_process::OsProcess;

/// How long a freshly spawned process must survive to count as started
pub const STARTUP_PROBE: Duration = Duration::from_millis(100);

/// How long to wait for stderr of a process that died during startup
const STDERR_GRACE: Duration = Duration::from_millis(500);

/// Raw PCM layout produced by SystemAudioDump
const PCM_FORMAT: &str = "s16le";
const SAMPLE_RATE: u32 = 24_000;
const CHANNELS: u32 = 2;

const MP3_CODEC: &str = "libmp3lame";

/// Encoder arguments for a session; the output path is always last
pub fn build_encoder_args(config: &RecorderConfig) -> Vec<String> {
    let mut args = vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        // Input: raw PCM on stdin
        "-f".to_string(),
        PCM_FORMAT.to_string(),
        "-ar".to_string(),
        SAMPLE_RATE.to_string(),
        "-ac".to_string(),
        CHANNELS.to_string(),
        "-i".to_string(),
        "pipe:0".to_string(),
        // Output: audio-only MP3
        "-c:a".to_string(),
        MP3_CODEC.to_string(),
        "-b:a".to_string(),
        config.bitrate().to_string(),
        "-vn".to_string(),
        "-sn".to_string(),
        "-t".to_string(),
        config.max_seconds().to_string(),
    ];

    if config.overwrite() {
        args.push("-y".to_string());
    }

    args.push(config.output_path().to_string_lossy().to_string());
    args
}

/// Launches SystemAudioDump with its stdout piped straight into ffmpeg
pub struct PipelineLauncher {
    probe_window: Duration,
}

impl PipelineLauncher {
    pub fn new() -> Self {
        Self {
            probe_window: STARTUP_PROBE,
        }
    }

    pub fn with_probe_window(mut self, window: Duration) -> Self {
        self.probe_window = window;
        self
    }

    fn capture_command(config: &RecorderConfig) -> Command {
        let mut command = Command::new(config.dump_bin());
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn encoder_command(config: &RecorderConfig, args: &[String], input: Stdio) -> Command {
        let mut command = Command::new(config.ffmpeg_bin());
        command
            .args(args)
            .stdin(input)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    /// Fails if the process exits before the probe window closes
    async fn probe(&self, process: &mut OsProcess) -> Result<(), LaunchError> {
        match process.wait(Some(self.probe_window)).await? {
            None => Ok(()),
            Some(code) => Err(LaunchError::ExitedEarly {
                role: process.role(),
                code,
                stderr: process.collect_stderr(STDERR_GRACE).await,
            }),
        }
    }
}

impl Default for PipelineLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessLauncher for PipelineLauncher {
    async fn launch(&self, config: &RecorderConfig) -> Result<ProcessPair, LaunchFailure> {
        log_command(config.dump_bin(), Vec::<String>::new());
        let mut capture =
            OsProcess::spawn(ProcessRole::Capture, &mut Self::capture_command(config))
                .map_err(LaunchFailure::new)?;

        if let Err(error) = self.probe(&mut capture).await {
            return Err(LaunchFailure::new(error).with_started(ProcessRole::Capture, Box::new(capture)));
        }

        let Some(stdout) = capture.take_stdout() else {
            let error = LaunchError::MissingStream {
                role: ProcessRole::Capture,
            };
            return Err(LaunchFailure::new(error).with_started(ProcessRole::Capture, Box::new(capture)));
        };

        let input: Stdio = match stdout.try_into() {
            Ok(input) => input,
            Err(e) => {
                let error = LaunchError::Spawn {
                    role: ProcessRole::Encoder,
                    message: format!("cannot attach capture output: {}", e),
                };
                return Err(
                    LaunchFailure::new(error).with_started(ProcessRole::Capture, Box::new(capture))
                );
            }
        };

        let args = build_encoder_args(config);
        log_command(config.ffmpeg_bin(), &args);
        let mut encoder_command = Self::encoder_command(config, &args, input);

        let mut encoder = match OsProcess::spawn(ProcessRole::Encoder, &mut encoder_command) {
            Ok(encoder) => encoder,
            Err(error) => {
                return Err(
                    LaunchFailure::new(error).with_started(ProcessRole::Capture, Box::new(capture))
                );
            }
        };
        // Our copy of the capture stream must close so ffmpeg sees EOF
        drop(encoder_command);
        encoder.discard_stdout();

        if let Err(error) = self.probe(&mut encoder).await {
            return Err(LaunchFailure::new(error)
                .with_started(ProcessRole::Encoder, Box::new(encoder))
                .with_started(ProcessRole::Capture, Box::new(capture)));
        }

        Ok(ProcessPair {
            capture: Box::new(capture),
            encoder: Box::new(encoder),
        })
    }
}

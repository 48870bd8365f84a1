//! Log helpers for commands and process outcomes

use std::ffi::OsStr;
use std::path::Path;

use tracing::{debug, error};

use super::ports::ProcessRole;

/// Render a command line for display
pub fn format_command<I, S>(program: &Path, args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut line = program.to_string_lossy().into_owned();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.as_ref().to_string_lossy());
    }
    line
}

/// Log a command that will be executed
pub fn log_command<I, S>(program: &Path, args: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    debug!("Executing: {}", format_command(program, args));
}

/// Log the result of a process execution
pub fn log_process_result(role: ProcessRole, code: i32, stderr: Option<&str>) {
    if code == 0 {
        debug!("{} completed successfully", role);
        return;
    }

    error!("{} failed with return code {}", role, code);
    if let Some(stderr) = stderr.map(str::trim).filter(|s| !s.is_empty()) {
        error!("{} stderr: {}", role, stderr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_command_joins_args() {
        let line = format_command(Path::new("/usr/bin/ffmpeg"), ["-hide_banner", "-t", "60"]);
        assert_eq!(line, "/usr/bin/ffmpeg -hide_banner -t 60");
    }

    #[test]
    fn format_command_without_args() {
        let line = format_command(Path::new("./SystemAudioDump"), Vec::<String>::new());
        assert_eq!(line, "./SystemAudioDump");
    }
}

//! Shell-script stand-ins for SystemAudioDump and ffmpeg

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Streams silence until its reader goes away
pub const STREAMING_CAPTURE: &str = r#"
while :; do
  head -c 9600 /dev/zero || exit 0
  sleep 0.1
done
"#;

/// Exits at once without output
pub const QUIET_CAPTURE: &str = "exit 0";

/// Fails like SystemAudioDump without Screen Recording permission
pub const DENIED_CAPTURE: &str = r#"
echo "Error: Screen Recording permission denied" >&2
exit 3
"#;

/// Minimal ffmpeg: answers `-version`, otherwise copies stdin to the last
/// argument until `-t` seconds pass or SIGINT/SIGTERM arrives.
pub const FAKE_FFMPEG: &str = r#"
if [ "$1" = "-version" ]; then
  echo "ffmpeg version 7.0-fake Copyright (c) the FFmpeg developers"
  echo "configuration: --enable-libmp3lame"
  exit 0
fi

dur=""
out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-t" ]; then dur="$arg"; fi
  prev="$arg"
  out="$arg"
done

trap 'kill $reader $timer 2>/dev/null; exit 0' INT TERM

# Asynchronous lists get /dev/null as stdin, so hand the pipe over on fd 3
exec 3<&0
: > "$out"
cat <&3 > "$out" &
reader=$!
sleep "$dur" &
timer=$!

wait $timer
kill $reader 2>/dev/null
exit 0
"#;

/// ffmpeg that rejects its arguments straight away
pub const FAILING_FFMPEG: &str = r#"
echo "Unknown encoder 'libmp3lame'" >&2
exit 1
"#;

/// Write an executable `/bin/sh` script
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
    path
}

/// Capture script that records its pid before streaming
pub fn pid_reporting_capture(dir: &Path, pid_file: &Path) -> PathBuf {
    let body = format!("echo $$ > \"{}\"\n{}", pid_file.display(), STREAMING_CAPTURE);
    write_script(dir, "SystemAudioDump", &body)
}

/// Read a pid written by [`pid_reporting_capture`]
pub fn read_pid(pid_file: &Path) -> i32 {
    fs::read_to_string(pid_file)
        .expect("pid file")
        .trim()
        .parse()
        .expect("pid")
}

/// Files in `dir` with the given extension
pub fn files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == extension))
            .collect(),
        Err(_) => Vec::new(),
    }
}

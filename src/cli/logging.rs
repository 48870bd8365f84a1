//! Tracing subscriber setup

use std::fmt;

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::EnvFilter;

/// Local wall-clock time as `HH:MM:SS`
struct ClockTime;

impl FormatTime for ClockTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S"))
    }
}

/// Default filter directive for the given verbosity
pub fn default_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("sli_recorder={},warn", level)
}

/// Install the global subscriber.
///
/// Plain mode prints bare messages to stdout so status lines read as text.
/// Verbose mode adds timestamps and levels. `RUST_LOG` wins over both.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_target(false);

    // A subscriber may already be set (e.g. by a test harness)
    let _ = if verbose {
        builder.with_timer(ClockTime).with_level(true).try_init()
    } else {
        builder.without_time().with_level(false).try_init()
    };
}

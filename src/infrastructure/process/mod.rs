//! Child process adapters

mod os_process;
mod pipeline;

pub use os_process::{exit_code_of, OsProcess};
pub use pipeline::{build_encoder_args, PipelineLauncher, STARTUP_PROBE};

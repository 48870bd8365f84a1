//! SLI Recorder CLI entry point

use std::process::ExitCode;

use clap::Parser;

use sli_recorder::cli::{run, Cli, EXIT_SUCCESS, EXIT_USAGE_ERROR};

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version also arrive here
            return if e.use_stderr() {
                ExitCode::from(EXIT_USAGE_ERROR)
            } else {
                ExitCode::from(EXIT_SUCCESS)
            };
        }
    };

    run(cli).await
}

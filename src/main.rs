//! Command-line entry point for the interpreter.

use std::error::Error;
use std::process;

use clap::Parser;
use tracing::{error, Level};
use tracing_subscriber::{fmt, EnvFilter};

use sweepvm::cli::Cli;

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let env_filter =
        EnvFilter::from_default_env().add_directive(format!("sweepvm={log_level}").parse().unwrap());

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .init();

    if let Err(e) = cli.run() {
        error!(severity = %e.severity(), "command failed: {e}");

        let mut cause = e.source();
        while let Some(err) = cause {
            error!("  caused by: {err}");
            cause = err.source();
        }

        process::exit(if e.is_recoverable() { 1 } else { 2 });
    }
}

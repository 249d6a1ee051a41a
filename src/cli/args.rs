use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command line interface for the interpreter.
#[derive(Debug, Parser)]
#[command(author, version, about = "Run and inspect self-rewriting token programs", long_about = None)]
pub struct Cli {
    /// Increase log verbosity; repeatable (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Optional path to a TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile and run a `.tok` program to a fixed point.
    Run {
        /// Path to the `.tok` source file.
        path: PathBuf,

        /// Cap on the number of sweeps before giving up.
        #[arg(long)]
        max_iterations: Option<u64>,
    },
    /// Compile a `.tok` program and print its initial token stream, without
    /// running it.
    Tokens {
        /// Path to the `.tok` source file.
        path: PathBuf,
    },
    /// Run a `.tok` program, logging the token stream after every sweep.
    Trace {
        /// Path to the `.tok` source file.
        path: PathBuf,

        /// Cap on the number of sweeps before giving up.
        #[arg(long)]
        max_iterations: Option<u64>,
    },
}

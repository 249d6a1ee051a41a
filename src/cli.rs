//! Command line interface: run, inspect, or trace a `.tok` program.

mod args;
mod runner;

pub use args::{Cli, Command};

//! CLI command execution.

use std::path::Path;

use crate::common::config::InterpreterConfig;
use crate::common::errors::InterpreterError;
use crate::core::evaluator::Evaluator;
use crate::frontend::compiler;

use super::args::{Cli, Command};

impl Cli {
    /// Execute the selected subcommand.
    pub fn run(&self) -> Result<(), InterpreterError> {
        match &self.command {
            Command::Run { path, max_iterations } => self.run_run(path, *max_iterations),
            Command::Tokens { path } => self.run_tokens(path),
            Command::Trace { path, max_iterations } => self.run_trace(path, *max_iterations),
        }
    }

    fn load_config(&self, max_iterations_override: Option<u64>) -> Result<InterpreterConfig, InterpreterError> {
        let mut config = match &self.config {
            Some(path) => InterpreterConfig::load_from_file(path)?,
            None => InterpreterConfig::default(),
        };
        config.print_buffer_enabled = true;
        if let Some(max) = max_iterations_override {
            config.max_iterations = max;
        }
        Ok(config)
    }

    fn run_run(&self, path: &Path, max_iterations: Option<u64>) -> Result<(), InterpreterError> {
        let source = std::fs::read_to_string(path)?;
        let tokens = compiler::compile(&source)?;
        let config = self.load_config(max_iterations)?;
        let mut evaluator = Evaluator::new(tokens, config);
        evaluator.run()?;
        print!("{}", evaluator.global_print_buffer);
        Ok(())
    }

    fn run_tokens(&self, path: &Path) -> Result<(), InterpreterError> {
        let source = std::fs::read_to_string(path)?;
        let tokens = compiler::compile(&source)?;
        for (i, token) in tokens.iter().enumerate() {
            println!("{i:4} {}", token.orig_str);
        }
        Ok(())
    }

    fn run_trace(&self, path: &Path, max_iterations: Option<u64>) -> Result<(), InterpreterError> {
        let source = std::fs::read_to_string(path)?;
        let tokens = compiler::compile(&source)?;
        let mut config = self.load_config(max_iterations)?;
        config.print_iterations = true;
        let mut evaluator = Evaluator::new(tokens, config);
        evaluator.run()?;
        print!("{}", evaluator.global_print_buffer);
        Ok(())
    }
}

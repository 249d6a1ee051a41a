//! Configuration for the interpreter: iteration cap and output toggles
//! (§4.8), loadable from a TOML file the same way the CLI layers flags over
//! it.

use serde::{Deserialize, Serialize};

use crate::common::errors::ConfigError;

/// Interpreter-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Emit the token stream (with `*` at the program counter) after every
    /// sweep.
    #[serde(default)]
    pub print_iterations: bool,

    /// Route `print`/`str` output through a sink rather than discarding it.
    #[serde(default)]
    pub print_buffer_enabled: bool,

    /// Sweep count at which the evaluator gives up and returns the current
    /// vector as-is.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
}

fn default_max_iterations() -> u64 {
    10_000_000
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            print_iterations: false,
            print_buffer_enabled: false,
            max_iterations: default_max_iterations(),
        }
    }
}

impl InterpreterConfig {
    pub fn load_from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        ConfigLoader::load_from_file(path)
    }
}

/// Loads [`InterpreterConfig`] from a TOML file.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load_from_file(path: &std::path::Path) -> Result<InterpreterConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.to_string_lossy().to_string(),
        })?;
        let config: InterpreterConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

//! Error types for the interpreter.

use thiserror::Error;

/// Main result type for interpreter operations.
pub type InterpreterResult<T> = Result<T, InterpreterError>;

/// Top-level error type. Only parse and type errors are fatal to a running
/// program (§7); shape errors and not-yet-ready operands are handled locally
/// by instruction handlers and never surface here.
#[derive(Error, Debug)]
pub enum InterpreterError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("type error: {0}")]
    Type(#[from] TypeError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors raised while building the tree view over a flat token vector, or
/// while compiling source text into tokens. Both are fatal.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unmatched `end` at token {index}")]
    UnmatchedEnd { index: usize },

    #[error("missing `end` for container opened at token {index}")]
    MissingEnd { index: usize },

    #[error("unknown opcode `{word}` on line {line}")]
    UnknownOpcode { word: String, line: usize },

    #[error("invalid numeric literal `{word}` on line {line}")]
    InvalidNumericLiteral { word: String, line: usize },

    #[error("label `{name}` referenced on line {line} was never defined")]
    UndefinedLabel { name: String, line: usize },

    #[error("unterminated string literal starting on line {line}")]
    UnterminatedString { line: usize },
}

/// Unknown token type encountered on a cast/promotion path. Fatal.
#[derive(Error, Debug)]
pub enum TypeError {
    #[error("unknown token type index {index}")]
    UnknownTypeIndex { index: i64 },
}

/// Configuration-loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("I/O error reading configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl InterpreterError {
    pub fn internal<T: Into<String>>(msg: T) -> Self {
        InterpreterError::Internal(msg.into())
    }

    /// User-input errors (bad source text) are recoverable in the sense that
    /// the CLI should report them and exit cleanly rather than panicking;
    /// internal errors are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, InterpreterError::Parse(_) | InterpreterError::Config(_))
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            InterpreterError::Parse(_) => ErrorSeverity::High,
            InterpreterError::Type(_) => ErrorSeverity::Critical,
            InterpreterError::Config(_) => ErrorSeverity::Medium,
            InterpreterError::Io(_) => ErrorSeverity::High,
            InterpreterError::Internal(_) => ErrorSeverity::Critical,
        }
    }
}

/// Error severity, used by the CLI to pick an exit code: anything below
/// `Critical` is a reportable user-input problem, `Critical` is a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "LOW"),
            ErrorSeverity::Medium => write!(f, "MEDIUM"),
            ErrorSeverity::High => write!(f, "HIGH"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_are_recoverable_but_type_errors_are_not() {
        let parse_err = InterpreterError::Parse(ParseError::UnmatchedEnd { index: 3 });
        assert!(parse_err.is_recoverable());

        let type_err = InterpreterError::Type(TypeError::UnknownTypeIndex { index: 9 });
        assert!(!type_err.is_recoverable());
        assert_eq!(type_err.severity(), ErrorSeverity::Critical);
    }
}

//! Parser error types

use thiserror::Error;

/// Errors raised while reading or scanning a Python module
#[derive(Debug, Error)]
pub enum ParseError {
    /// The module file could not be read
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The module file is not UTF-8
    #[error("'{path}' is not valid UTF-8")]
    Encoding { path: String },

    #[error("Unterminated string literal starting at line {line}")]
    UnterminatedString { line: usize },

    /// A closing bracket without a matching opener
    #[error("Unexpected '{found}' at line {line}")]
    UnbalancedBracket { found: char, line: usize },

    #[error("'{open}' opened at line {line} is never closed")]
    UnclosedBracket { open: char, line: usize },

    #[error("Unexpected character '{found}' at line {line}")]
    UnexpectedCharacter { found: char, line: usize },

    /// A `def` statement whose header cannot be read
    #[error("Invalid function definition at line {line}: {reason}")]
    InvalidDefinition { line: usize, reason: String },
}

impl ParseError {
    pub(crate) fn invalid_definition(line: usize, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            line,
            reason: reason.into(),
        }
    }
}

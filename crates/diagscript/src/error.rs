//! Error types for diagscript
//!
//! Every failure is reported synchronously by the stage that detects it. Errors
//! carry the command keyword and the offending argument so callers can produce a
//! precise diagnostic; the document-level parser wraps them with a line number
//! via [`Error::at_line`].

use crate::limits::LimitExceeded;
use thiserror::Error;

/// Result type alias using diagscript's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// diagscript error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A quoted span was opened but never closed.
    #[error("unterminated {quote} quote starting at column {column}")]
    MalformedQuote { quote: char, column: usize },

    /// The line starts with a keyword that is not in the registry.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// An argument could not be bound because its target parameter is already
    /// bound, or the command has no default parameter to receive it.
    #[error("{command}: too many arguments: unexpected argument {index} '{token}'")]
    TooManyArguments {
        command: String,
        /// 1-based position of the argument on the line.
        index: usize,
        token: String,
    },

    /// A required parameter has no value after all arguments were bound.
    #[error("{command}: missing argument '{parameter}'")]
    MissingArgument { command: String, parameter: String },

    /// A bound value was rejected by the command constructor.
    #[error("{command}: invalid value for '{parameter}': {reason}")]
    InvalidArgument {
        command: String,
        parameter: String,
        reason: String,
    },

    /// A singleton command declared with the reject policy appeared twice.
    #[error("{0} declared more than once")]
    DuplicateCommand(String),

    /// A parameter schema violates its invariants.
    #[error("invalid schema for {command}: {reason}")]
    InvalidSchema { command: String, reason: String },

    /// Parse limit exceeded.
    #[error("parse limit exceeded: {0}")]
    LimitExceeded(#[from] LimitExceeded),

    /// Error with the 1-based source line it occurred on.
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach a source line number. Errors already carrying one are unchanged.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Self::AtLine { .. } => self,
            other => Self::AtLine {
                line,
                source: Box::new(other),
            },
        }
    }

    /// The line number attached by the script parser, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::AtLine { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// The underlying error with any line information stripped.
    pub fn kind(&self) -> &Error {
        match self {
            Self::AtLine { source, .. } => source.kind(),
            other => other,
        }
    }

    pub(crate) fn invalid_argument(
        command: &str,
        parameter: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            command: command.to_string(),
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }
}

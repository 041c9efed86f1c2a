//! Parse limits
//!
//! Scripts come from users; these bounds keep a single parse from consuming
//! unbounded memory on hostile input.

use thiserror::Error;

/// Limits applied while parsing a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLimits {
    /// Maximum length of a single source line in bytes
    /// Default: 4096
    pub max_line_length: usize,

    /// Maximum number of command lines (blank and comment lines are not counted)
    /// Default: 10,000
    pub max_lines: usize,

    /// Maximum number of argument tokens on one line
    /// Default: 64
    pub max_tokens_per_line: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_line_length: 4096,
            max_lines: 10_000,
            max_tokens_per_line: 64,
        }
    }
}

impl ParseLimits {
    /// Create new limits with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum line length
    pub fn max_line_length(mut self, bytes: usize) -> Self {
        self.max_line_length = bytes;
        self
    }

    /// Set maximum command line count
    pub fn max_lines(mut self, count: usize) -> Self {
        self.max_lines = count;
        self
    }

    /// Set maximum tokens per line
    pub fn max_tokens_per_line(mut self, count: usize) -> Self {
        self.max_tokens_per_line = count;
        self
    }

    pub(crate) fn check_line_length(&self, line: &str) -> Result<(), LimitExceeded> {
        if line.len() > self.max_line_length {
            return Err(LimitExceeded::LineLength {
                length: line.len(),
                max: self.max_line_length,
            });
        }
        Ok(())
    }

    pub(crate) fn check_line_count(&self, count: usize) -> Result<(), LimitExceeded> {
        if count > self.max_lines {
            return Err(LimitExceeded::Lines(self.max_lines));
        }
        Ok(())
    }

    pub(crate) fn check_token_count(&self, count: usize) -> Result<(), LimitExceeded> {
        if count > self.max_tokens_per_line {
            return Err(LimitExceeded::Tokens(self.max_tokens_per_line));
        }
        Ok(())
    }
}

/// Which limit was exceeded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LimitExceeded {
    #[error("line is {length} bytes (max {max})")]
    LineLength { length: usize, max: usize },

    #[error("more than {0} command lines")]
    Lines(usize),

    #[error("more than {0} arguments on one line")]
    Tokens(usize),
}

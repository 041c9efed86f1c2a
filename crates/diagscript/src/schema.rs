//! Parameter schemas
//!
//! A schema lists the parameters a command accepts. At most one parameter is
//! the default: it receives an argument written without a `name:` prefix.

use std::collections::HashSet;

use crate::error::{Error, Result};

/// A single declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    pub name: &'static str,
    pub is_default: bool,
    pub required: bool,
}

impl Parameter {
    /// An optional, named-only parameter.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            is_default: false,
            required: false,
        }
    }

    /// Mark this parameter as the target for unqualified arguments.
    pub const fn default_target(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Ordered set of parameters for one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSchema {
    parameters: Vec<Parameter>,
}

impl ParameterSchema {
    pub fn new(parameters: impl IntoIterator<Item = Parameter>) -> Self {
        Self {
            parameters: parameters.into_iter().collect(),
        }
    }

    /// Check that names are unique and at most one parameter is the default.
    pub fn validate(&self, command: &str) -> Result<()> {
        let invalid = |reason: String| Error::InvalidSchema {
            command: command.to_string(),
            reason,
        };

        let mut seen = HashSet::new();
        for param in &self.parameters {
            if param.name.is_empty() || param.name.contains(':') {
                return Err(invalid(format!("invalid parameter name '{}'", param.name)));
            }
            if !seen.insert(param.name) {
                return Err(invalid(format!("duplicate parameter '{}'", param.name)));
            }
        }

        let defaults = self.parameters.iter().filter(|p| p.is_default).count();
        if defaults > 1 {
            return Err(invalid(format!("{defaults} default parameters")));
        }
        Ok(())
    }

    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn default_parameter(&self) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.is_default)
    }

    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter()
    }

    pub fn required(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|p| p.required)
    }
}

/// How many instances of a command a script keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// At most one instance per script.
    Singleton,
    /// Every occurrence is kept in source order.
    Multi,
}

/// What happens when a singleton command appears again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Redeclare {
    /// The later declaration replaces the earlier one.
    #[default]
    Overwrite,
    /// The later declaration is an error.
    Reject,
}

/// Where a parsed command is stored in a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Script-level configuration, kept in the keyed command table.
    Preamble,
    /// A build step, kept in the ordered action list.
    Action,
}

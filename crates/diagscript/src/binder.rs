//! Argument binding
//!
//! Resolves the (quote-resolved, expanded) tokens of one command line to
//! parameters of its schema:
//!
//! - `name:value` binds `value` to `name` when `name` is declared. Only the
//!   first colon separates; `path:a:b` binds `a:b`.
//! - Any other token is unqualified and binds to the default parameter.
//! - Each parameter binds at most once.
//!
//! A `name:` prefix that is not declared is not an error; the whole token is
//! treated as an unqualified value.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::expand::Token;
use crate::schema::ParameterSchema;

/// Parameter values bound for one command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    command: String,
    values: BTreeMap<&'static str, String>,
}

impl Arguments {
    /// Keyword of the command these arguments belong to.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Value of a parameter the schema declares as required.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| Error::MissingArgument {
            command: self.command.clone(),
            parameter: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Bind `tokens` to the parameters of `schema`.
///
/// Only [`Token::Raw`] tokens are checked for a `name:` prefix; expanded
/// values always bind to the default parameter.
pub fn bind<T: Into<Token>>(
    command: &str,
    schema: &ParameterSchema,
    tokens: impl IntoIterator<Item = T>,
) -> Result<Arguments> {
    let mut values = BTreeMap::new();
    let mut empty = true;
    for (index, token) in tokens.into_iter().map(Into::into).enumerate() {
        empty = false;
        let named = match &token {
            Token::Raw(text) => text
                .split_once(':')
                .and_then(|(name, value)| schema.get(name).map(|p| (p, value.to_string()))),
            Token::Expanded(_) => None,
        };
        let token = token.into_value();

        let (param, value) = match named {
            Some(binding) => binding,
            None => match schema.default_parameter() {
                Some(param) => (param, token.clone()),
                None => return Err(too_many(command, index, token)),
            },
        };

        if values.contains_key(param.name) {
            return Err(too_many(command, index, token));
        }

        #[cfg(feature = "logging")]
        tracing::trace!(
            command,
            parameter = param.name,
            index = index + 1,
            "bound argument"
        );

        values.insert(param.name, value);
    }

    let missing = if empty {
        schema
            .default_parameter()
            .or_else(|| schema.required().next())
    } else {
        schema.required().find(|p| !values.contains_key(p.name))
    };
    if let Some(param) = missing {
        return Err(Error::MissingArgument {
            command: command.to_string(),
            parameter: param.name.to_string(),
        });
    }

    Ok(Arguments {
        command: command.to_string(),
        values,
    })
}

fn too_many(command: &str, index: usize, token: String) -> Error {
    Error::TooManyArguments {
        command: command.to_string(),
        index: index + 1,
        token,
    }
}

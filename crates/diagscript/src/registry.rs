//! Command registry
//!
//! Maps a command keyword to its [`CommandSpec`]: the parameter schema, where
//! the command is stored, how repeats are handled, and the constructor that
//! turns bound [`Arguments`] into a typed [`Command`].
//!
//! A registry is built once and then shared read-only, usually behind an `Arc`.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::binder::{self, Arguments};
use crate::commands::{self, Command};
use crate::error::{Error, Result};
use crate::expand::Token;
use crate::schema::{Cardinality, CommandKind, ParameterSchema, Redeclare};

/// Constructor for a typed command.
pub type BuildFn = fn(&Arguments) -> Result<Command>;

static BUILTIN: LazyLock<Arc<Registry>> = LazyLock::new(|| Arc::new(Registry::builtin()));

/// Declaration of one command keyword.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub keyword: &'static str,
    pub kind: CommandKind,
    pub cardinality: Cardinality,
    pub redeclare: Redeclare,
    pub schema: ParameterSchema,
    pub build: BuildFn,
}

impl CommandSpec {
    /// A singleton preamble command that overwrites on redeclaration.
    pub fn preamble(keyword: &'static str, schema: ParameterSchema, build: BuildFn) -> Self {
        Self {
            keyword,
            kind: CommandKind::Preamble,
            cardinality: Cardinality::Singleton,
            redeclare: Redeclare::Overwrite,
            schema,
            build,
        }
    }

    /// An action command; every occurrence is kept.
    pub fn action(keyword: &'static str, schema: ParameterSchema, build: BuildFn) -> Self {
        Self {
            keyword,
            kind: CommandKind::Action,
            cardinality: Cardinality::Multi,
            redeclare: Redeclare::Overwrite,
            schema,
            build,
        }
    }

    pub fn cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn redeclare(mut self, redeclare: Redeclare) -> Self {
        self.redeclare = redeclare;
        self
    }

    /// Bind expanded tokens and construct the command.
    pub fn construct<T: Into<Token>>(
        &self,
        tokens: impl IntoIterator<Item = T>,
    ) -> Result<Command> {
        let args = binder::bind(self.keyword, &self.schema, tokens)?;
        (self.build)(&args)
    }
}

/// Keyword to [`CommandSpec`] lookup table.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    specs: HashMap<&'static str, CommandSpec>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in command.
    pub fn builtin() -> Self {
        let specs = commands::builtin_specs()
            .into_iter()
            .map(|spec| (spec.keyword, spec))
            .collect();
        Self { specs }
    }

    /// The process-wide built-in registry.
    pub fn shared_builtin() -> Arc<Registry> {
        Arc::clone(&BUILTIN)
    }

    /// Add or replace a command after validating its schema.
    pub fn register(&mut self, spec: CommandSpec) -> Result<&mut Self> {
        if spec.keyword.is_empty() || spec.keyword.chars().any(char::is_whitespace) {
            return Err(Error::InvalidSchema {
                command: spec.keyword.to_string(),
                reason: "keyword must be a single word".to_string(),
            });
        }
        spec.schema.validate(spec.keyword)?;
        self.specs.insert(spec.keyword, spec);
        Ok(self)
    }

    /// Apply a redeclaration policy to every singleton command.
    pub fn with_redeclare(mut self, redeclare: Redeclare) -> Self {
        for spec in self.specs.values_mut() {
            if spec.cardinality == Cardinality::Singleton {
                spec.redeclare = redeclare;
            }
        }
        self
    }

    /// Look up a keyword. Matching is case-sensitive.
    pub fn get(&self, keyword: &str) -> Result<&CommandSpec> {
        self.specs
            .get(keyword)
            .ok_or_else(|| Error::UnknownCommand(keyword.to_string()))
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.specs.contains_key(keyword)
    }

    /// Registered keywords in sorted order.
    pub fn keywords(&self) -> Vec<&'static str> {
        let mut keywords: Vec<_> = self.specs.keys().copied().collect();
        keywords.sort_unstable();
        keywords
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::OutputCommand;
    use crate::schema::Parameter;

    fn build_output(args: &Arguments) -> Result<Command> {
        Ok(Command::Output(OutputCommand::new(args.require("path")?)))
    }

    #[test]
    fn test_builtin_keywords() {
        let registry = Registry::builtin();
        assert_eq!(
            registry.keywords(),
            vec![
                "AS",
                "AUTHCONFIG",
                "CAPTURE",
                "COPY",
                "ENV",
                "FROM",
                "KUBECONFIG",
                "OUTPUT",
                "RUN",
                "WORKDIR"
            ]
        );
    }

    #[test]
    fn test_builtin_schemas_are_valid() {
        let registry = Registry::builtin();
        for keyword in registry.keywords() {
            let spec = registry.get(keyword).unwrap();
            spec.schema.validate(keyword).unwrap();
        }
    }

    #[test]
    fn test_output_spec() {
        let registry = Registry::builtin();
        let spec = registry.get("OUTPUT").unwrap();
        assert_eq!(spec.kind, CommandKind::Preamble);
        assert_eq!(spec.cardinality, Cardinality::Singleton);
        assert_eq!(spec.redeclare, Redeclare::Overwrite);
        let default = spec.schema.default_parameter().unwrap();
        assert_eq!(default.name, "path");
        assert!(default.required);
    }

    #[test]
    fn test_unknown_and_case_sensitive() {
        let registry = Registry::builtin();
        assert_eq!(
            registry.get("output").unwrap_err(),
            Error::UnknownCommand("output".to_string())
        );
        assert!(registry.get("BUILD").is_err());
    }

    #[test]
    fn test_isolated_registry() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());

        let schema = ParameterSchema::new([Parameter::new("path").default_target().required()]);
        registry
            .register(CommandSpec::preamble("OUT", schema, build_output))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("OUT"));
        assert!(!registry.contains("OUTPUT"));

        let cmd = registry
            .get("OUT")
            .unwrap()
            .construct(vec!["x.tar.gz".to_string()])
            .unwrap();
        assert_eq!(cmd, Command::Output(OutputCommand::new("x.tar.gz")));
    }

    #[test]
    fn test_register_rejects_invalid_schema() {
        let mut registry = Registry::new();
        let schema = ParameterSchema::new([
            Parameter::new("a").default_target(),
            Parameter::new("b").default_target(),
        ]);
        assert!(matches!(
            registry.register(CommandSpec::preamble("BAD", schema, build_output)),
            Err(Error::InvalidSchema { .. })
        ));

        let schema = ParameterSchema::new([Parameter::new("path")]);
        assert!(
            registry
                .register(CommandSpec::preamble("TWO WORDS", schema, build_output))
                .is_err()
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_with_redeclare_only_touches_singletons() {
        let registry = Registry::builtin().with_redeclare(Redeclare::Reject);
        assert_eq!(registry.get("OUTPUT").unwrap().redeclare, Redeclare::Reject);
        assert_eq!(registry.get("ENV").unwrap().redeclare, Redeclare::Overwrite);
        assert_eq!(registry.get("RUN").unwrap().redeclare, Redeclare::Overwrite);
    }

    #[test]
    fn test_shared_builtin_is_shared() {
        let a = Registry::shared_builtin();
        let b = Registry::shared_builtin();
        assert!(Arc::ptr_eq(&a, &b));
    }
}

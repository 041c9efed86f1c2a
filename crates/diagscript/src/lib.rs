//! diagscript - parser for line-oriented diagnostics scripts
//!
//! A script is a sequence of lines, each a command keyword followed by
//! arguments. Arguments are either `name:value` or a single unqualified value
//! bound to the command's default parameter:
//!
//! ```text
//! # collect logs from two nodes
//! FROM hosts:'10.0.0.1 10.0.0.2' port:2222
//! OUTPUT $ARCHIVE
//! COPY '/var/log/syslog /var/log/kern.log'
//! CAPTURE cmd:'df -h'
//! ```
//!
//! # Example
//!
//! ```rust
//! use diagscript::{Command, ScriptParser};
//!
//! # fn main() -> diagscript::Result<()> {
//! let parser = ScriptParser::builder()
//!     .env("ARCHIVE", "diag/out.tar.gz")
//!     .build();
//! let script = parser.parse("OUTPUT $ARCHIVE\nRUN cmd:'uptime'")?;
//!
//! assert_eq!(script.output(), "diag/out.tar.gz");
//! assert!(matches!(&script.actions()[0], Command::Run(run) if run.cmd() == "uptime"));
//! # Ok(())
//! # }
//! ```

mod binder;
mod commands;
mod error;
mod expand;
mod lexer;
mod limits;
mod logging_impl;
mod registry;
mod schema;
mod script;

pub use binder::{Arguments, bind};
pub use commands::{
    AsCommand, AuthConfigCommand, CaptureCommand, Command, CopyCommand, DEFAULT_HOST,
    DEFAULT_KUBECONFIG, DEFAULT_OUTPUT, DEFAULT_PORT, DEFAULT_WORKDIR, EnvCommand, EnvVar,
    FromCommand, KubeConfigCommand, OutputCommand, RunCommand, WorkdirCommand,
};
pub use error::{Error, Result};
pub use expand::{Environment, Expander, Layered, ProcessEnv, Token, is_identifier, variable_name};
pub use lexer::{Lexer, split_command, tokenize};
pub use limits::{LimitExceeded, ParseLimits};
pub use logging_impl::{LogConfig, sanitize_for_log};
pub use registry::{BuildFn, CommandSpec, Registry};
pub use schema::{Cardinality, CommandKind, Parameter, ParameterSchema, Redeclare};
pub use script::{CommandTable, Script};

use std::collections::HashMap;
use std::sync::Arc;

/// Parse `source` with the built-in commands and the process environment.
pub fn parse(source: &str) -> Result<Script> {
    ScriptParser::new().parse(source)
}

/// Document-level parser.
///
/// Runs every line through tokenizing, variable expansion and argument binding,
/// then stores the command in the script. Cheap to clone; the registry and
/// environment are shared.
#[derive(Clone)]
pub struct ScriptParser {
    registry: Arc<Registry>,
    env: Arc<dyn Environment>,
    limits: ParseLimits,
    log_config: LogConfig,
}

impl Default for ScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptParser")
            .field("commands", &self.registry.keywords())
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl ScriptParser {
    /// Create a parser with the built-in commands and the process environment.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a ScriptParserBuilder for customized configuration.
    pub fn builder() -> ScriptParserBuilder {
        ScriptParserBuilder::default()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn environment(&self) -> &dyn Environment {
        self.env.as_ref()
    }

    /// Parse a whole document.
    ///
    /// Errors carry the 1-based line number they occurred on. Nothing from a
    /// failing line is stored.
    pub fn parse(&self, source: &str) -> Result<Script> {
        #[cfg(feature = "logging")]
        tracing::debug!(
            lines = source.lines().count(),
            bytes = source.len(),
            "parsing script"
        );

        let mut script = Script::default();
        let mut commands = 0;

        for (index, line) in source.lines().enumerate() {
            let line_number = index + 1;
            let bound = self
                .bind_line(line)
                .map_err(|err| err.at_line(line_number))?;
            let Some((spec, command)) = bound else {
                continue;
            };

            commands += 1;
            self.limits
                .check_line_count(commands)
                .map_err(|err| Error::from(err).at_line(line_number))?;
            script
                .insert(spec, command)
                .map_err(|err| err.at_line(line_number))?;
        }

        Ok(script)
    }

    /// Parse a single line. Blank and comment lines yield `None`.
    pub fn parse_line(&self, line: &str) -> Result<Option<Command>> {
        Ok(self.bind_line(line)?.map(|(_, command)| command))
    }

    fn bind_line(&self, line: &str) -> Result<Option<(&CommandSpec, Command)>> {
        self.limits.check_line_length(line)?;
        if line.trim_start().starts_with('#') {
            return Ok(None);
        }
        let Some((keyword, tokens)) = split_command(line)? else {
            return Ok(None);
        };

        let spec = self.registry.get(&keyword)?;
        self.limits.check_token_count(tokens.len())?;

        #[cfg(feature = "logging")]
        tracing::debug!(
            command = spec.keyword,
            arguments = tokens.len(),
            line = %self.log_config.line_for_log(line),
            "binding command"
        );

        let tokens = Expander::new(self.env.as_ref(), &self.log_config).expand_all(tokens);
        let command = spec.construct(tokens)?;
        Ok(Some((spec, command)))
    }
}

/// Builder for customized ScriptParser configuration.
#[derive(Default)]
pub struct ScriptParserBuilder {
    registry: Option<Arc<Registry>>,
    env: Option<Arc<dyn Environment>>,
    vars: HashMap<String, String>,
    limits: ParseLimits,
    log_config: LogConfig,
}

impl ScriptParserBuilder {
    /// Use a custom command registry instead of the built-in one.
    pub fn registry(mut self, registry: impl Into<Arc<Registry>>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    /// Use a custom environment instead of the process environment.
    pub fn environment(mut self, env: impl Environment + 'static) -> Self {
        self.env = Some(Arc::new(env));
        self
    }

    /// Set a variable that takes precedence over the environment.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn limits(mut self, limits: ParseLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// Build the ScriptParser.
    pub fn build(self) -> ScriptParser {
        let registry = self.registry.unwrap_or_else(Registry::shared_builtin);
        let base = self
            .env
            .unwrap_or_else(|| Arc::new(ProcessEnv) as Arc<dyn Environment>);
        let env: Arc<dyn Environment> = if self.vars.is_empty() {
            base
        } else {
            Arc::new(Layered::new(self.vars, base))
        };

        ScriptParser {
            registry,
            env,
            limits: self.limits,
            log_config: self.log_config,
        }
    }
}

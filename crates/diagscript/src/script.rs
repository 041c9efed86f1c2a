//! Parsed scripts
//!
//! Preamble commands live in a [`CommandTable`] keyed by keyword; actions are
//! kept in source order. A [`Script`] is read-only once the parser returns it.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::commands::{
    AsCommand, AuthConfigCommand, Command, DEFAULT_HOST, DEFAULT_KUBECONFIG, DEFAULT_OUTPUT,
    DEFAULT_PORT, DEFAULT_WORKDIR, EnvVar, FromCommand,
};
use crate::error::{Error, Result};
use crate::expand::Environment;
use crate::registry::CommandSpec;
use crate::schema::{Cardinality, CommandKind, Redeclare};

/// Commands grouped by keyword, each group in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommandTable {
    entries: BTreeMap<&'static str, Vec<Command>>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `command` under `spec.keyword`, honoring its multiplicity.
    ///
    /// A singleton command replaces an earlier entry, or fails with
    /// [`Error::DuplicateCommand`] when its [`CommandSpec`] uses [`Redeclare::Reject`].
    pub fn insert(&mut self, spec: &CommandSpec, command: Command) -> Result<()> {
        let entry = self.entries.entry(spec.keyword).or_default();
        if spec.cardinality == Cardinality::Singleton && !entry.is_empty() {
            match spec.redeclare {
                Redeclare::Reject => return Err(Error::DuplicateCommand(spec.keyword.to_string())),
                Redeclare::Overwrite => {
                    #[cfg(feature = "logging")]
                    tracing::warn!(command = spec.keyword, "overwriting earlier declaration");
                    entry.clear();
                }
            }
        }
        entry.push(command);
        Ok(())
    }

    /// Commands declared under `keyword`; empty if none.
    pub fn get(&self, keyword: &str) -> &[Command] {
        self.entries
            .get(keyword)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn keywords(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[Command])> {
        self.entries.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Number of keywords with at least one command.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A parsed script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Script {
    preambles: CommandTable,
    actions: Vec<Command>,
}

impl Script {
    pub(crate) fn insert(&mut self, spec: &CommandSpec, command: Command) -> Result<()> {
        match spec.kind {
            CommandKind::Preamble => self.preambles.insert(spec, command),
            CommandKind::Action => {
                self.actions.push(command);
                Ok(())
            }
        }
    }

    pub fn preambles(&self) -> &CommandTable {
        &self.preambles
    }

    /// Action commands in source order.
    pub fn actions(&self) -> &[Command] {
        &self.actions
    }

    fn last(&self, keyword: &str) -> Option<&Command> {
        self.preambles.get(keyword).last()
    }

    /// Declared `OUTPUT` path, or [`DEFAULT_OUTPUT`].
    pub fn output(&self) -> &str {
        match self.last("OUTPUT") {
            Some(Command::Output(cmd)) => cmd.path(),
            _ => DEFAULT_OUTPUT,
        }
    }

    /// Declared `WORKDIR` path, or [`DEFAULT_WORKDIR`].
    pub fn workdir(&self) -> &str {
        match self.last("WORKDIR") {
            Some(Command::Workdir(cmd)) => cmd.path(),
            _ => DEFAULT_WORKDIR,
        }
    }

    pub fn from_command(&self) -> Option<&FromCommand> {
        match self.last("FROM") {
            Some(Command::From(cmd)) => Some(cmd),
            _ => None,
        }
    }

    /// Declared hosts, or [`DEFAULT_HOST`].
    pub fn hosts(&self) -> Vec<&str> {
        match self.from_command() {
            Some(from) => from.hosts().iter().map(String::as_str).collect(),
            None => vec![DEFAULT_HOST],
        }
    }

    pub fn port(&self) -> u16 {
        self.from_command().map_or(DEFAULT_PORT, FromCommand::port)
    }

    pub fn run_as(&self) -> Option<&AsCommand> {
        match self.last("AS") {
            Some(Command::As(cmd)) => Some(cmd),
            _ => None,
        }
    }

    pub fn auth_config(&self) -> Option<&AuthConfigCommand> {
        match self.last("AUTHCONFIG") {
            Some(Command::AuthConfig(cmd)) => Some(cmd),
            _ => None,
        }
    }

    /// Declared `KUBECONFIG` path, or [`DEFAULT_KUBECONFIG`] under `$HOME`.
    pub fn kube_config(&self, env: &dyn Environment) -> String {
        match self.last("KUBECONFIG") {
            Some(Command::KubeConfig(cmd)) => cmd.path().to_string(),
            _ => {
                let home = env.var("HOME").unwrap_or_default();
                format!("{}/{}", home.trim_end_matches('/'), DEFAULT_KUBECONFIG)
            }
        }
    }

    /// Every `ENV` pair in declaration order.
    pub fn env_vars(&self) -> impl Iterator<Item = &EnvVar> {
        self.preambles
            .get("ENV")
            .iter()
            .filter_map(|cmd| match cmd {
                Command::Env(env) => Some(env.vars()),
                _ => None,
            })
            .flatten()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::commands::{EnvCommand, OutputCommand, RunCommand};
    use crate::registry::Registry;

    fn output(path: &str) -> Command {
        Command::Output(OutputCommand::new(path))
    }

    #[test]
    fn test_singleton_overwrites() {
        let registry = Registry::builtin();
        let spec = registry.get("OUTPUT").unwrap();
        let mut table = CommandTable::new();

        table.insert(spec, output("foo/bar")).unwrap();
        table.insert(spec, output("bazz/buzz.tar.gz")).unwrap();

        assert_eq!(table.get("OUTPUT"), [output("bazz/buzz.tar.gz")]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_singleton_reject() {
        let registry = Registry::builtin().with_redeclare(Redeclare::Reject);
        let spec = registry.get("OUTPUT").unwrap();
        let mut table = CommandTable::new();

        table.insert(spec, output("first")).unwrap();
        assert_eq!(
            table.insert(spec, output("second")).unwrap_err(),
            Error::DuplicateCommand("OUTPUT".to_string())
        );
        assert_eq!(table.get("OUTPUT"), [output("first")]);
    }

    #[test]
    fn test_multi_appends() {
        let registry = Registry::builtin();
        let spec = registry.get("ENV").unwrap();
        let mut table = CommandTable::new();

        let a = spec.construct(["A=1"]).unwrap();
        let b = spec.construct(["B=2"]).unwrap();
        table.insert(spec, a.clone()).unwrap();
        table.insert(spec, b.clone()).unwrap();

        assert_eq!(table.get("ENV"), [a, b]);
    }

    #[test]
    fn test_get_missing_is_empty() {
        let table = CommandTable::new();
        assert!(table.get("OUTPUT").is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn test_script_routes_by_kind() {
        let registry = Registry::builtin();
        let mut script = Script::default();

        script
            .insert(registry.get("OUTPUT").unwrap(), output("o.tar.gz"))
            .unwrap();
        let run = Command::Run(RunCommand::new("uptime", None));
        script
            .insert(registry.get("RUN").unwrap(), run.clone())
            .unwrap();

        assert_eq!(
            script.preambles().keywords().collect::<Vec<_>>(),
            vec!["OUTPUT"]
        );
        assert_eq!(script.actions(), [run]);
        assert!(script.preambles().get("RUN").is_empty());
    }

    #[test]
    fn test_defaults() {
        let script = Script::default();
        assert_eq!(script.output(), DEFAULT_OUTPUT);
        assert_eq!(script.workdir(), DEFAULT_WORKDIR);
        assert_eq!(script.hosts(), vec![DEFAULT_HOST]);
        assert_eq!(script.port(), DEFAULT_PORT);
        assert!(script.from_command().is_none());
        assert!(script.run_as().is_none());
        assert!(script.auth_config().is_none());
        assert_eq!(script.env_vars().count(), 0);

        let env: HashMap<String, String> =
            HashMap::from([("HOME".to_string(), "/home/diag/".to_string())]);
        assert_eq!(script.kube_config(&env), "/home/diag/.kube/config");
    }

    #[test]
    fn test_env_vars_flatten_in_order() {
        let registry = Registry::builtin();
        let spec = registry.get("ENV").unwrap();
        let mut script = Script::default();
        script
            .insert(spec, spec.construct(["A=1 B=2"]).unwrap())
            .unwrap();
        script
            .insert(
                spec,
                Command::Env(EnvCommand::new(vec![EnvVar {
                    name: "C".into(),
                    value: "3".into(),
                }])),
            )
            .unwrap();

        let names: Vec<_> = script.env_vars().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }
}

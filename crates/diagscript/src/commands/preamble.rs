//! Preamble commands: script-level configuration.

use serde::Serialize;

use super::{Command, split_list};
use crate::binder::Arguments;
use crate::error::{Error, Result};
use crate::expand::is_identifier;
use crate::registry::CommandSpec;
use crate::schema::{Cardinality, Parameter, ParameterSchema};

/// Archive path used when a script declares no `OUTPUT`.
pub const DEFAULT_OUTPUT: &str = "out.tar.gz";
/// Working directory used when a script declares no `WORKDIR`.
pub const DEFAULT_WORKDIR: &str = "/tmp/crashdir";
/// Host used when a script declares no `FROM`.
pub const DEFAULT_HOST: &str = "local";
/// SSH port used when `FROM` has no `port:`.
pub const DEFAULT_PORT: u16 = 22;
/// Kubeconfig location relative to `$HOME` when no `KUBECONFIG` is declared.
pub const DEFAULT_KUBECONFIG: &str = ".kube/config";

/// `OUTPUT path:<file>`: where the collected archive is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputCommand {
    path: String,
}

impl OutputCommand {
    pub const KEYWORD: &'static str = "OUTPUT";

    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn spec() -> CommandSpec {
        CommandSpec::preamble(Self::KEYWORD, path_schema(), |args| {
            Ok(Command::Output(Self::new(args.require("path")?)))
        })
    }
}

/// `WORKDIR path:<dir>`: scratch directory for collected files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkdirCommand {
    path: String,
}

impl WorkdirCommand {
    pub const KEYWORD: &'static str = "WORKDIR";

    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn spec() -> CommandSpec {
        CommandSpec::preamble(Self::KEYWORD, path_schema(), |args| {
            Ok(Command::Workdir(Self::new(args.require("path")?)))
        })
    }
}

/// `KUBECONFIG path:<file>`: cluster credentials for the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KubeConfigCommand {
    path: String,
}

impl KubeConfigCommand {
    pub const KEYWORD: &'static str = "KUBECONFIG";

    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn spec() -> CommandSpec {
        CommandSpec::preamble(Self::KEYWORD, path_schema(), |args| {
            Ok(Command::KubeConfig(Self::new(args.require("path")?)))
        })
    }
}

fn path_schema() -> ParameterSchema {
    ParameterSchema::new([Parameter::new("path").default_target().required()])
}

/// `FROM hosts:'<host> ...' [port:<n>]`: machines to collect from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FromCommand {
    hosts: Vec<String>,
    port: u16,
}

impl FromCommand {
    pub const KEYWORD: &'static str = "FROM";

    pub fn new(hosts: Vec<String>, port: u16) -> Self {
        Self { hosts, port }
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub(crate) fn spec() -> CommandSpec {
        let schema = ParameterSchema::new([
            Parameter::new("hosts").default_target().required(),
            Parameter::new("port"),
        ]);
        CommandSpec::preamble(Self::KEYWORD, schema, Self::build)
    }

    fn build(args: &Arguments) -> Result<Command> {
        let hosts = split_list(Self::KEYWORD, "hosts", args.require("hosts")?)?;
        let port = match args.get("port") {
            Some(value) => parse_port(value)?,
            None => DEFAULT_PORT,
        };
        Ok(Command::From(Self::new(hosts, port)))
    }
}

fn parse_port(value: &str) -> Result<u16> {
    match value.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(Error::invalid_argument(
            FromCommand::KEYWORD,
            "port",
            format!("'{value}' is not a port number"),
        )),
    }
}

/// `AS userid:<uid> [groupid:<gid>]`: identity used on the remote hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AsCommand {
    #[serde(rename = "userid")]
    user_id: String,
    #[serde(rename = "groupid", skip_serializing_if = "Option::is_none")]
    group_id: Option<String>,
}

impl AsCommand {
    pub const KEYWORD: &'static str = "AS";

    pub fn new(user_id: impl Into<String>, group_id: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            group_id,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    pub(crate) fn spec() -> CommandSpec {
        let schema = ParameterSchema::new([
            Parameter::new("userid").default_target().required(),
            Parameter::new("groupid"),
        ]);
        CommandSpec::preamble(Self::KEYWORD, schema, |args| {
            Ok(Command::As(Self::new(
                args.require("userid")?,
                args.get("groupid").map(str::to_string),
            )))
        })
    }
}

/// `AUTHCONFIG username:<name> [private-key:<file>]`: SSH credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AuthConfigCommand {
    username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    private_key: Option<String>,
}

impl AuthConfigCommand {
    pub const KEYWORD: &'static str = "AUTHCONFIG";

    pub fn new(username: impl Into<String>, private_key: Option<String>) -> Self {
        Self {
            username: username.into(),
            private_key,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn private_key(&self) -> Option<&str> {
        self.private_key.as_deref()
    }

    pub(crate) fn spec() -> CommandSpec {
        // No default parameter: both values must be named.
        let schema = ParameterSchema::new([
            Parameter::new("username").required(),
            Parameter::new("private-key"),
        ]);
        CommandSpec::preamble(Self::KEYWORD, schema, |args| {
            Ok(Command::AuthConfig(Self::new(
                args.require("username")?,
                args.get("private-key").map(str::to_string),
            )))
        })
    }
}

/// One `KEY=VALUE` pair declared by `ENV`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// `ENV vars:'KEY=VALUE ...'`: variables exported to actions. Repeatable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvCommand {
    vars: Vec<EnvVar>,
}

impl EnvCommand {
    pub const KEYWORD: &'static str = "ENV";

    pub fn new(vars: Vec<EnvVar>) -> Self {
        Self { vars }
    }

    pub fn vars(&self) -> &[EnvVar] {
        &self.vars
    }

    pub(crate) fn spec() -> CommandSpec {
        let schema = ParameterSchema::new([Parameter::new("vars").default_target().required()]);
        CommandSpec::preamble(Self::KEYWORD, schema, Self::build).cardinality(Cardinality::Multi)
    }

    fn build(args: &Arguments) -> Result<Command> {
        let vars = split_list(Self::KEYWORD, "vars", args.require("vars")?)?
            .into_iter()
            .map(|item| match item.split_once('=') {
                Some((name, value)) if is_identifier(name) => Ok(EnvVar {
                    name: name.to_string(),
                    value: value.to_string(),
                }),
                _ => Err(Error::invalid_argument(
                    Self::KEYWORD,
                    "vars",
                    format!("expected KEY=VALUE, got '{item}'"),
                )),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Command::Env(Self::new(vars)))
    }
}

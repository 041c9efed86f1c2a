//! Built-in commands
//!
//! Each command is an immutable value object built from bound arguments.
//! Preambles configure the script as a whole; actions are the steps the
//! executor runs in order.

mod action;
mod preamble;

pub use action::{CaptureCommand, CopyCommand, RunCommand};
pub use preamble::{
    AsCommand, AuthConfigCommand, DEFAULT_HOST, DEFAULT_KUBECONFIG, DEFAULT_OUTPUT, DEFAULT_PORT,
    DEFAULT_WORKDIR, EnvCommand, EnvVar, FromCommand, KubeConfigCommand, OutputCommand,
    WorkdirCommand,
};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::registry::CommandSpec;

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "UPPERCASE")]
pub enum Command {
    Output(OutputCommand),
    Workdir(WorkdirCommand),
    From(FromCommand),
    As(AsCommand),
    #[serde(rename = "KUBECONFIG")]
    KubeConfig(KubeConfigCommand),
    #[serde(rename = "AUTHCONFIG")]
    AuthConfig(AuthConfigCommand),
    Env(EnvCommand),
    Copy(CopyCommand),
    Capture(CaptureCommand),
    Run(RunCommand),
}

impl Command {
    /// The keyword this command is declared with.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Output(_) => OutputCommand::KEYWORD,
            Self::Workdir(_) => WorkdirCommand::KEYWORD,
            Self::From(_) => FromCommand::KEYWORD,
            Self::As(_) => AsCommand::KEYWORD,
            Self::KubeConfig(_) => KubeConfigCommand::KEYWORD,
            Self::AuthConfig(_) => AuthConfigCommand::KEYWORD,
            Self::Env(_) => EnvCommand::KEYWORD,
            Self::Copy(_) => CopyCommand::KEYWORD,
            Self::Capture(_) => CaptureCommand::KEYWORD,
            Self::Run(_) => RunCommand::KEYWORD,
        }
    }

    pub fn as_output(&self) -> Option<&OutputCommand> {
        match self {
            Self::Output(cmd) => Some(cmd),
            _ => None,
        }
    }
}

pub(crate) fn builtin_specs() -> Vec<CommandSpec> {
    vec![
        OutputCommand::spec(),
        WorkdirCommand::spec(),
        FromCommand::spec(),
        AsCommand::spec(),
        KubeConfigCommand::spec(),
        AuthConfigCommand::spec(),
        EnvCommand::spec(),
        CopyCommand::spec(),
        CaptureCommand::spec(),
        RunCommand::spec(),
    ]
}

/// Split a whitespace-separated list value; at least one item is required.
pub(crate) fn split_list(command: &str, parameter: &str, value: &str) -> Result<Vec<String>> {
    let items: Vec<String> = value.split_whitespace().map(str::to_string).collect();
    if items.is_empty() {
        return Err(Error::invalid_argument(
            command,
            parameter,
            "expected at least one item",
        ));
    }
    Ok(items)
}

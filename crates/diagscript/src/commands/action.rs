//! Action commands: collection steps, kept in source order.

use serde::Serialize;

use super::{Command, split_list};
use crate::registry::CommandSpec;
use crate::schema::{Parameter, ParameterSchema};

/// `COPY paths:'<path> ...'`: files copied into the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyCommand {
    paths: Vec<String>,
}

impl CopyCommand {
    pub const KEYWORD: &'static str = "COPY";

    pub fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub(crate) fn spec() -> CommandSpec {
        let schema = ParameterSchema::new([Parameter::new("paths").default_target().required()]);
        CommandSpec::action(Self::KEYWORD, schema, |args| {
            let paths = split_list(Self::KEYWORD, "paths", args.require("paths")?)?;
            Ok(Command::Copy(Self::new(paths)))
        })
    }
}

/// `CAPTURE cmd:'<command>' [shell:<shell>]`: command whose output is archived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureCommand {
    cmd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    shell: Option<String>,
}

impl CaptureCommand {
    pub const KEYWORD: &'static str = "CAPTURE";

    pub fn new(cmd: impl Into<String>, shell: Option<String>) -> Self {
        Self {
            cmd: cmd.into(),
            shell,
        }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    pub fn shell(&self) -> Option<&str> {
        self.shell.as_deref()
    }

    pub(crate) fn spec() -> CommandSpec {
        CommandSpec::action(Self::KEYWORD, shell_schema(), |args| {
            Ok(Command::Capture(Self::new(
                args.require("cmd")?,
                args.get("shell").map(str::to_string),
            )))
        })
    }
}

/// `RUN cmd:'<command>' [shell:<shell>]`: command run for its side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunCommand {
    cmd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    shell: Option<String>,
}

impl RunCommand {
    pub const KEYWORD: &'static str = "RUN";

    pub fn new(cmd: impl Into<String>, shell: Option<String>) -> Self {
        Self {
            cmd: cmd.into(),
            shell,
        }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    pub fn shell(&self) -> Option<&str> {
        self.shell.as_deref()
    }

    pub(crate) fn spec() -> CommandSpec {
        CommandSpec::action(Self::KEYWORD, shell_schema(), |args| {
            Ok(Command::Run(Self::new(
                args.require("cmd")?,
                args.get("shell").map(str::to_string),
            )))
        })
    }
}

fn shell_schema() -> ParameterSchema {
    ParameterSchema::new([
        Parameter::new("cmd").default_target().required(),
        Parameter::new("shell"),
    ])
}

//! diagscript CLI - Parse diagnostics scripts and print the result as JSON
//!
//! Usage:
//!   diagscript -c 'OUTPUT out.tar.gz'     # Parse a script string
//!   diagscript diag.script                # Parse a script file
//!   diagscript --strict diag.script       # Reject redeclared preambles
//!   diagscript --env ARCHIVE=x diag.script

use anyhow::{Context, Result, bail};
use clap::Parser;
use diagscript::{Redeclare, Registry, ScriptParser};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// diagscript - Diagnostics script parser
#[derive(Parser, Debug)]
#[command(name = "diagscript")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Parse the given script string
    #[arg(short = 'c')]
    command: Option<String>,

    /// Script file to parse
    #[arg()]
    script: Option<PathBuf>,

    /// Set a variable for `$NAME` expansion (overrides the process environment)
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    env: Vec<(String, String)>,

    /// Fail when a single-instance command is declared twice
    #[arg(long)]
    strict: bool,

    /// Log parsing progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Parse a `KEY=VALUE` pair for `--env`.
fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty variable name in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn init_logging() {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into());
    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_parser(args: &Args) -> ScriptParser {
    let mut builder = ScriptParser::builder();
    if args.strict {
        builder = builder.registry(Registry::builtin().with_redeclare(Redeclare::Reject));
    }
    for (key, value) in &args.env {
        builder = builder.env(key, value);
    }
    builder.build()
}

/// Parse the selected script and render it as pretty JSON.
fn run(args: &Args) -> Result<String> {
    let source = match (&args.command, &args.script) {
        (Some(cmd), _) => cmd.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script: {}", path.display()))?,
        (None, None) => bail!("no script given\nUsage: diagscript -c 'script' or diagscript FILE"),
    };

    let script = build_parser(args)
        .parse(&source)
        .context("Failed to parse script")?;
    serde_json::to_string_pretty(&script).context("Failed to serialize script")
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.verbose {
        init_logging();
    }

    let json = run(&args)?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("diagscript").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_env_pair() {
        assert_eq!(
            parse_env_pair("ARCHIVE=out.tar.gz"),
            Ok(("ARCHIVE".to_string(), "out.tar.gz".to_string()))
        );
        assert_eq!(
            parse_env_pair("EMPTY="),
            Ok(("EMPTY".to_string(), String::new()))
        );
        assert_eq!(
            parse_env_pair("A=b=c"),
            Ok(("A".to_string(), "b=c".to_string()))
        );
        assert!(parse_env_pair("NOEQUALS").is_err());
        assert!(parse_env_pair("=value").is_err());
    }

    #[test]
    fn test_inline_script() {
        let json = run(&args(&["-c", "OUTPUT out.tar.gz"])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["preambles"]["OUTPUT"][0]["path"], "out.tar.gz");
        assert_eq!(value["actions"], serde_json::json!([]));
    }

    #[test]
    fn test_env_flag_overrides() {
        let json = run(&args(&[
            "--env",
            "DIAG_CLI_ARCHIVE=from-flag.tar.gz",
            "-c",
            "OUTPUT $DIAG_CLI_ARCHIVE",
        ]))
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["preambles"]["OUTPUT"][0]["path"], "from-flag.tar.gz");
    }

    #[test]
    fn test_script_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# diagnostics").unwrap();
        writeln!(file, "WORKDIR /tmp/diag").unwrap();
        writeln!(file, "RUN 'uname -a'").unwrap();

        let path = file.path().to_str().unwrap();
        let json = run(&args(&[path])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["preambles"]["WORKDIR"][0]["path"], "/tmp/diag");
        assert_eq!(value["actions"][0]["command"], "RUN");
        assert_eq!(value["actions"][0]["cmd"], "uname -a");
    }

    #[test]
    fn test_missing_file() {
        let err = run(&args(&["/nonexistent/diag.script"])).unwrap_err();
        assert!(err.to_string().contains("Failed to read script"));
    }

    #[test]
    fn test_strict_rejects_redeclaration() {
        let source = "OUTPUT a.tar.gz\nOUTPUT b.tar.gz";
        assert!(run(&args(&["-c", source])).is_ok());

        let err = run(&args(&["--strict", "-c", source])).unwrap_err();
        let root = err.root_cause().to_string();
        assert!(root.contains("OUTPUT"), "{root}");
        assert!(format!("{err:#}").contains("line 2"), "{err:#}");
    }

    #[test]
    fn test_parse_error_has_context() {
        let err = run(&args(&["-c", "OUTPUT a b"])).unwrap_err();
        assert!(err.to_string().contains("Failed to parse script"));
    }

    #[test]
    fn test_no_input() {
        assert!(run(&args(&[])).is_err());
    }
}

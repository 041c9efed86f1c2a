//! Logging support for diagscript
//!
//! Events are emitted through `tracing` when the `logging` feature is enabled.
//! Scripts routinely expand credentials (`AUTHCONFIG private-key:$KEY_PATH`,
//! `ENV` pairs), so values pass through [`LogConfig`] before they reach a log.
//!
//! # Log Levels
//!
//! - **WARN**: A singleton command overwrote an earlier declaration
//! - **DEBUG**: One event per parsed line and per variable expansion
//! - **TRACE**: Individual parameter bindings

use std::borrow::Cow;
use std::collections::HashSet;

const REDACTED: &str = "[REDACTED]";

/// Name fragments that mark an environment variable as sensitive.
const SENSITIVE_ENV_PATTERNS: &[&str] = &[
    "PASSWORD",
    "PASSWD",
    "PASSPHRASE",
    "SECRET",
    "TOKEN",
    "KEY",
    "CREDENTIAL",
    "AUTH",
    "PRIVATE",
    "BEARER",
    "SESSION",
    "COOKIE",
    "CERT",
    "DATABASE_URL",
    "CONNECTION_STRING",
    "AWS_ACCESS",
];

/// Prefixes of well-known credential formats.
const SECRET_PREFIXES: &[&str] = &[
    "sk-", "sk_live_", "sk_test_", "ghp_", "gho_", "ghs_", "xoxb-", "xoxp-", "AKIA", "eyJ",
];

/// Configuration for what may appear in log output
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether to redact sensitive data from logs (default: true)
    pub redact_sensitive: bool,

    /// Environment variable name fragments to redact (case-insensitive)
    pub redact_env_vars: HashSet<String>,

    /// Whether raw script lines may be logged (default: false)
    pub log_script_content: bool,

    /// Maximum length of logged values before truncation (default: 200)
    pub max_value_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            redact_sensitive: true,
            redact_env_vars: SENSITIVE_ENV_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            log_script_content: false,
            max_value_length: 200,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable redaction. Only for trusted debugging environments.
    pub fn unsafe_disable_redaction(mut self) -> Self {
        self.redact_sensitive = false;
        self
    }

    /// Add an environment variable name fragment to redact
    pub fn redact_env(mut self, pattern: &str) -> Self {
        self.redact_env_vars.insert(pattern.to_uppercase());
        self
    }

    /// Allow raw script lines in logs. Scripts may embed credentials.
    pub fn unsafe_log_scripts(mut self) -> Self {
        self.log_script_content = true;
        self
    }

    pub fn max_value_length(mut self, len: usize) -> Self {
        self.max_value_length = len;
        self
    }

    /// Check if an environment variable name should be redacted
    pub fn should_redact_env(&self, name: &str) -> bool {
        if !self.redact_sensitive {
            return false;
        }
        let upper = name.to_uppercase();
        self.redact_env_vars
            .iter()
            .any(|pattern| upper.contains(pattern.as_str()))
    }

    /// Render the value of environment variable `name` for a log line.
    pub fn env_value_for_log<'a>(&self, name: &str, value: &'a str) -> Cow<'a, str> {
        if self.should_redact_env(name) {
            return Cow::Borrowed(REDACTED);
        }
        self.redact_value(value)
    }

    /// Redact a value if it looks like a credential, truncate otherwise.
    pub fn redact_value<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if self.redact_sensitive && is_likely_secret(value) {
            return Cow::Borrowed(REDACTED);
        }
        self.truncate(value)
    }

    /// Render a script line for a log event.
    pub fn line_for_log(&self, line: &str) -> String {
        if !self.log_script_content {
            return format!("[{} bytes]", line.len());
        }
        self.truncate(&sanitize_for_log(line)).into_owned()
    }

    /// Truncate on a char boundary at or before `max_value_length`.
    fn truncate<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if value.len() <= self.max_value_length {
            return Cow::Borrowed(value);
        }
        let mut end = self.max_value_length;
        while end > 0 && !value.is_char_boundary(end) {
            end -= 1;
        }
        Cow::Owned(format!(
            "{}...[truncated {} bytes]",
            &value[..end],
            value.len() - end
        ))
    }
}

/// Heuristic for values that look like tokens or keys.
fn is_likely_secret(value: &str) -> bool {
    let trimmed = value.trim();
    let lower = trimmed.to_lowercase();
    if lower.contains("password") || lower.starts_with("bearer ") || lower.starts_with("basic ")
    {
        return true;
    }

    if SECRET_PREFIXES
        .iter()
        .any(|prefix| trimmed.starts_with(prefix) && trimmed.len() > prefix.len() + 10)
    {
        return true;
    }

    trimmed.len() >= 32 && is_high_entropy(trimmed)
}

/// High ratio of distinct characters in a token-shaped string.
fn is_high_entropy(s: &str) -> bool {
    if !s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return false;
    }
    let unique: HashSet<char> = s.chars().collect();
    let ratio = unique.len() as f64 / s.len() as f64;
    ratio > 0.5 && unique.len() > 15
}

/// Escape control characters so a script line cannot forge log entries.
pub fn sanitize_for_log(input: &str) -> String {
    input
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}

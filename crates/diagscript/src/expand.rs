//! Variable expansion
//!
//! A token that is exactly `$NAME` or `${NAME}` is replaced by the value of
//! `NAME` in the active [`Environment`]. Unset variables expand to the empty
//! string. An expanded value is tagged as [`Token::Expanded`] so the binder
//! never splits it as `name:value`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::logging_impl::LogConfig;

/// Read-only source of variable values.
pub trait Environment: Send + Sync {
    /// Current value of `name`, or `None` if unset.
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment, read at expansion time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<E: Environment + ?Sized> Environment for Arc<E> {
    fn var(&self, name: &str) -> Option<String> {
        self.as_ref().var(name)
    }
}

/// Looks up `overlay` first and falls back to `fallback`.
#[derive(Debug, Clone, Default)]
pub struct Layered<A, B> {
    overlay: A,
    fallback: B,
}

impl<A, B> Layered<A, B> {
    pub fn new(overlay: A, fallback: B) -> Self {
        Self { overlay, fallback }
    }
}

impl<A: Environment, B: Environment> Environment for Layered<A, B> {
    fn var(&self, name: &str) -> Option<String> {
        self.overlay.var(name).or_else(|| self.fallback.var(name))
    }
}

/// Check whether `s` is a valid variable name (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The variable referenced by `token`, if the whole token is a reference.
pub fn variable_name(token: &str) -> Option<&str> {
    let rest = token.strip_prefix('$')?;
    let name = match rest.strip_prefix('{') {
        Some(braced) => braced.strip_suffix('}')?,
        None => rest,
    };
    is_identifier(name).then_some(name)
}

/// An argument token ready for binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Written in the script; may carry a `name:` prefix.
    Raw(String),
    /// Produced by variable expansion; always a literal value.
    Expanded(String),
}

impl Token {
    pub fn value(&self) -> &str {
        match self {
            Self::Raw(value) | Self::Expanded(value) => value,
        }
    }

    pub fn into_value(self) -> String {
        match self {
            Self::Raw(value) | Self::Expanded(value) => value,
        }
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self::Raw(value)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self::Raw(value.to_string())
    }
}

/// Expands variable tokens against an environment.
pub struct Expander<'a> {
    env: &'a dyn Environment,
    #[cfg_attr(not(feature = "logging"), allow(dead_code))]
    log_config: &'a LogConfig,
}

impl<'a> Expander<'a> {
    pub fn new(env: &'a dyn Environment, log_config: &'a LogConfig) -> Self {
        Self { env, log_config }
    }

    /// Expand a single token. Non-reference tokens are returned unchanged.
    pub fn expand(&self, token: String) -> Token {
        let Some(name) = variable_name(&token) else {
            return Token::Raw(token);
        };
        let value = self.env.var(name);

        #[cfg(feature = "logging")]
        tracing::debug!(
            variable = name,
            set = value.is_some(),
            value = %self.log_config.env_value_for_log(name, value.as_deref().unwrap_or_default()),
            "expanded variable"
        );

        Token::Expanded(value.unwrap_or_default())
    }

    /// Expand every token in order.
    pub fn expand_all(&self, tokens: Vec<String>) -> Vec<Token> {
        tokens.into_iter().map(|t| self.expand(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_identifier() {
        assert!(is_identifier("foopath"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("a-b"));
    }

    #[test]
    fn test_variable_name() {
        assert_eq!(variable_name("$foopath"), Some("foopath"));
        assert_eq!(variable_name("${foopath}"), Some("foopath"));
        assert_eq!(variable_name("$"), None);
        assert_eq!(variable_name("${foo"), None);
        assert_eq!(variable_name("$1x"), None);
        assert_eq!(variable_name("$foo/bar"), None);
        assert_eq!(variable_name("path:$foo"), None);
        assert_eq!(variable_name("foo"), None);
    }

    #[test]
    fn test_expand_set_and_unset() {
        let vars = env(&[("foopath", "foo/bar.tar.gz")]);
        let log_config = LogConfig::new();
        let expander = Expander::new(&vars, &log_config);

        let expanded = |value: &str| Token::Expanded(value.to_string());
        assert_eq!(
            expander.expand("$foopath".to_string()),
            expanded("foo/bar.tar.gz")
        );
        assert_eq!(
            expander.expand("${foopath}".to_string()),
            expanded("foo/bar.tar.gz")
        );
        assert_eq!(expander.expand("$missing".to_string()), expanded(""));
        assert_eq!(expander.expand("plain".to_string()), Token::from("plain"));
    }

    #[test]
    fn test_expanded_value_is_not_rescanned() {
        let vars = env(&[("a", "$b"), ("b", "nope")]);
        let log_config = LogConfig::new();
        let expander = Expander::new(&vars, &log_config);
        assert_eq!(
            expander.expand("$a".to_string()),
            Token::Expanded("$b".to_string())
        );
    }

    #[test]
    fn test_expand_all_preserves_order() {
        let vars = env(&[("x", "1"), ("y", "2")]);
        let log_config = LogConfig::new();
        let expander = Expander::new(&vars, &log_config);
        let tokens = expander.expand_all(vec!["$y".into(), "mid".into(), "$x".into()]);
        assert_eq!(
            tokens.iter().map(Token::value).collect::<Vec<_>>(),
            vec!["2", "mid", "1"]
        );
        assert_eq!(tokens[1], Token::Raw("mid".to_string()));
    }

    #[test]
    fn test_expanded_value_keeps_colon() {
        let vars = env(&[("dest", "path:x.tar.gz")]);
        let log_config = LogConfig::new();
        let expander = Expander::new(&vars, &log_config);
        let token = expander.expand("$dest".to_string());
        assert_eq!(token, Token::Expanded("path:x.tar.gz".to_string()));
        assert_eq!(token.into_value(), "path:x.tar.gz");
    }

    #[test]
    fn test_layered_lookup() {
        let layered = Layered::new(
            env(&[("a", "overlay")]),
            env(&[("a", "base"), ("b", "base")]),
        );
        assert_eq!(layered.var("a").as_deref(), Some("overlay"));
        assert_eq!(layered.var("b").as_deref(), Some("base"));
        assert_eq!(layered.var("c"), None);
    }
}

//! Tokenizer for script lines
//!
//! Splits one source line into whitespace-separated tokens. Quoted spans may
//! appear anywhere inside a token (`'a b'`, `path:'a b'`, `a"b c"d`); whitespace
//! inside them does not split, and the quote characters are dropped.

use crate::error::{Error, Result};

/// Lexer over a single source line.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    /// 1-based column of the next character
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given line.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            column: 1,
        }
    }

    /// Get the next token, or `None` at end of line.
    pub fn next_token(&mut self) -> Result<Option<String>> {
        self.skip_whitespace();
        if self.peek_char().is_none() {
            return Ok(None);
        }

        let mut word = String::new();
        while let Some(ch) = self.peek_char() {
            match ch {
                c if c.is_whitespace() => break,
                '\'' | '"' => self.read_quoted(ch, &mut word)?,
                _ => {
                    word.push(ch);
                    self.advance();
                }
            }
        }
        Ok(Some(word))
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next();
        if ch.is_some() {
            self.column += 1;
        }
        ch
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if !ch.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    /// Append the contents of a quoted span to `word`.
    ///
    /// Single quotes are fully literal. Inside double quotes a backslash escapes
    /// `"` and `\`; any other backslash is kept as written.
    fn read_quoted(&mut self, quote: char, word: &mut String) -> Result<()> {
        let column = self.column;
        self.advance(); // opening quote

        while let Some(ch) = self.advance() {
            if ch == quote {
                return Ok(());
            }
            if ch == '\\' && quote == '"' {
                match self.peek_char() {
                    Some(next @ ('"' | '\\')) => {
                        word.push(next);
                        self.advance();
                    }
                    _ => word.push('\\'),
                }
                continue;
            }
            word.push(ch);
        }

        Err(Error::MalformedQuote { quote, column })
    }
}

/// Split a line into its tokens.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut lexer = Lexer::new(line);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

/// Split a line into its command keyword and argument tokens.
///
/// Returns `None` for a blank line.
pub fn split_command(line: &str) -> Result<Option<(String, Vec<String>)>> {
    let mut tokens = tokenize(line)?.into_iter();
    Ok(tokens.next().map(|keyword| (keyword, tokens.collect())))
}

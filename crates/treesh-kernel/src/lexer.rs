//! Quote-aware splitting of a command line into words.
//!
//! Built on the logos lexer generator. The line is lexed into fragments
//! (bare text, single-quoted, double-quoted, backslash escapes); fragments
//! with no whitespace between them join into one word, so `pre"fix s"uf`
//! is the single word `prefix suf`.
//!
//! Quoting rules:
//! - `'...'` is literal, no escapes
//! - `"..."` allows `\"` and `\\`; any other backslash is kept as-is
//! - `\x` outside quotes is the literal character `x`
//!
//! Words carry a glob pattern alongside their text in which quoted and
//! escaped characters are escaped again, so only unquoted metacharacters
//! act as wildcards: `"my dir"/*.txt` expands, `'*.txt'` does not.

use std::ops::Range;

use logos::Logos;
use thiserror::Error;

/// One lexed fragment. Whitespace separates words and is skipped.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
enum Fragment {
    #[regex(r"'[^']*'")]
    SingleQuoted,

    #[regex(r#""([^"\\]|\\(.|\n))*""#)]
    DoubleQuoted,

    #[regex(r"\\(.|\n)")]
    Escaped,

    #[regex(r#"[^ \t\r\n'"\\]+"#)]
    Bare,
}

/// Tokenizer errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated {quote} quote at offset {offset}")]
    UnterminatedQuote { quote: char, offset: usize },
    #[error("dangling backslash at offset {offset}")]
    DanglingEscape { offset: usize },
}

/// A shell word after quote removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Text with quotes and escapes removed.
    pub text: String,
    /// The word as a glob pattern: quoted characters are backslash-escaped.
    pub pattern: String,
    /// True if any part of the word was quoted or escaped.
    pub quoted: bool,
    /// True if an unquoted part contains a glob metacharacter.
    pub globbable: bool,
    /// Byte range in the source line.
    pub span: Range<usize>,
}

impl Word {
    /// True if the word should go through wildcard expansion.
    pub fn is_expandable(&self) -> bool {
        self.globbable
    }
}

/// Split a command line into words.
pub fn tokenize(line: &str) -> Result<Vec<Word>, LexError> {
    let mut words: Vec<Word> = Vec::new();
    let mut current: Option<Word> = None;

    for (result, span) in Fragment::lexer(line).spanned() {
        let fragment = match result {
            Ok(fragment) => fragment,
            Err(()) => return Err(classify_error(line, span.start)),
        };

        let slice = &line[span.clone()];
        let (text, quoted) = match fragment {
            Fragment::Bare => (slice.to_string(), false),
            Fragment::SingleQuoted => (slice[1..slice.len() - 1].to_string(), true),
            Fragment::DoubleQuoted => (unescape_double(&slice[1..slice.len() - 1]), true),
            Fragment::Escaped => (slice[1..].to_string(), true),
        };
        let (pattern, globbable) = if quoted {
            (escape_glob(&text), false)
        } else {
            (text.clone(), treesh_glob::contains_glob(&text))
        };

        match current.as_mut() {
            Some(word) if word.span.end == span.start => {
                word.text.push_str(&text);
                word.pattern.push_str(&pattern);
                word.quoted |= quoted;
                word.globbable |= globbable;
                word.span.end = span.end;
            }
            _ => {
                if let Some(done) = current.take() {
                    words.push(done);
                }
                current = Some(Word {
                    text,
                    pattern,
                    quoted,
                    globbable,
                    span,
                });
            }
        }
    }

    if let Some(done) = current {
        words.push(done);
    }
    Ok(words)
}

fn classify_error(line: &str, offset: usize) -> LexError {
    match line[offset..].chars().next() {
        Some(quote @ ('\'' | '"')) => LexError::UnterminatedQuote { quote, offset },
        _ => LexError::DanglingEscape { offset },
    }
}

fn escape_glob(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn unescape_double(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(&next @ ('"' | '\\')) => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

//! Wildcard expansion of path tokens.
//!
//! Only the last segment of a token is a pattern: `src/*.rs` lists `src`
//! and matches `*.rs` against its entry names. Matches come back in the
//! router's sort order, prefixed with the directory text as typed when the
//! search directory is not the working directory.
//!
//! A pattern matching nothing is a successful empty result. The batch form
//! substitutes the literal token in that case so the downstream command can
//! report "no such file" against what the user typed.

use treesh_glob::Pattern;
use treesh_types::{ListOptions, PathContext, VfsResult};

use crate::lexer::Word;
use crate::paths;
use crate::vfs::VfsRouter;

/// True if `token` contains glob metacharacters (`*`, `?`, `[`, `]`).
pub fn has_wildcard(token: &str) -> bool {
    treesh_glob::contains_glob(token)
}

/// Expands tokens against one working directory.
#[derive(Debug, Clone, Copy)]
pub struct Expander<'a> {
    router: &'a VfsRouter,
    ctx: &'a PathContext,
    options: ListOptions,
}

impl<'a> Expander<'a> {
    pub fn new(router: &'a VfsRouter, ctx: &'a PathContext) -> Self {
        Self {
            router,
            ctx,
            options: ListOptions::default(),
        }
    }

    /// Order matches by something other than name.
    pub fn with_options(mut self, options: ListOptions) -> Self {
        self.options = ListOptions {
            self_only: false,
            ..options
        };
        self
    }

    /// Expand one token.
    ///
    /// Tokens without metacharacters come back unchanged and never touch the
    /// router.
    pub async fn expand(&self, token: &str) -> VfsResult<Vec<String>> {
        if !has_wildcard(token) {
            return Ok(vec![token.to_string()]);
        }
        self.matches(token, token).await
    }

    /// List the directory named by `text` and match the last segment of
    /// `pattern` against it. Both must carry the same `/` separators.
    async fn matches(&self, text: &str, pattern: &str) -> VfsResult<Vec<String>> {
        let (dir_text, _) = paths::split_last(text);
        let (_, pattern_text) = paths::split_last(pattern);
        let dir = match dir_text {
            Some(text) => paths::resolve(text, self.ctx),
            None => self.ctx.cwd.clone(),
        };

        let entries = self.router.list(&dir, self.options).await?;
        let pattern = Pattern::new(pattern_text);
        let prefix = match dir_text {
            Some(text) if dir != self.ctx.cwd => text,
            _ => "",
        };

        let matches: Vec<String> = entries
            .iter()
            .filter(|e| pattern.matches_name(&e.name))
            .map(|e| format!("{prefix}{}", e.name))
            .collect();
        tracing::debug!(token = text, dir = %dir, matches = matches.len(), "expanded");
        Ok(matches)
    }

    /// Expand tokens in order. A token matching nothing is kept literally;
    /// the first listing failure fails the batch.
    #[tracing::instrument(level = "debug", skip_all, fields(tokens = tokens.len()))]
    pub async fn expand_all<S: AsRef<str>>(&self, tokens: &[S]) -> VfsResult<Vec<String>> {
        let mut out = Vec::with_capacity(tokens.len());
        for token in tokens {
            self.expand_into(token.as_ref(), &mut out).await?;
        }
        Ok(out)
    }

    /// Like [`expand_all`](Self::expand_all) over lexed words. Quoted
    /// characters never act as wildcards.
    pub async fn expand_words(&self, words: &[Word]) -> VfsResult<Vec<String>> {
        let mut out = Vec::with_capacity(words.len());
        for word in words {
            if word.is_expandable() {
                let matches = self.matches(&word.text, &word.pattern).await?;
                push_or_literal(&mut out, matches, &word.text);
            } else {
                out.push(word.text.clone());
            }
        }
        Ok(out)
    }

    async fn expand_into(&self, token: &str, out: &mut Vec<String>) -> VfsResult<()> {
        let matches = self.expand(token).await?;
        push_or_literal(out, matches, token);
        Ok(())
    }
}

fn push_or_literal(out: &mut Vec<String>, matches: Vec<String>, literal: &str) {
    if matches.is_empty() {
        out.push(literal.to_string());
    } else {
        out.extend(matches);
    }
}

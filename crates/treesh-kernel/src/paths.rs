//! Path resolution: user-typed tokens to canonical paths.
//!
//! Resolution is a pure function of the token and a [`PathContext`]:
//!
//! 1. A leading `~` becomes the session user's home (`/home/{user}`, or `/`
//!    for an anonymous session); `~name` becomes `/home/name`.
//! 2. Anything not starting with `/` is joined onto the working directory.
//! 3. The result is normalized: `.`/`..` collapse, duplicate and trailing
//!    slashes go away, nothing climbs above `/`.
//!
//! Link dereferencing is not done here; see [`crate::links`].

use treesh_types::{CanonicalPath, PathContext, home_of};

/// Resolve a path token against a context. Total: every input yields a path.
///
/// An empty token resolves to the working directory.
pub fn resolve(token: &str, ctx: &PathContext) -> CanonicalPath {
    if token.is_empty() {
        return ctx.cwd.clone();
    }
    let expanded = expand_home(token, ctx);
    ctx.cwd.join(&expanded)
}

/// Expand a leading `~` or `~name`. Other tokens are returned unchanged.
///
/// The result is either absolute or the original (relative) token.
pub fn expand_home(token: &str, ctx: &PathContext) -> String {
    let Some(rest) = token.strip_prefix('~') else {
        return token.to_string();
    };

    let (user_part, tail) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };

    let home = if user_part.is_empty() {
        ctx.home()
    } else {
        home_of(Some(user_part))
    };

    if tail.is_empty() {
        home.to_string()
    } else {
        format!("{}{}", home, tail)
    }
}

/// Split a token into its directory text and final segment.
///
/// `"sub/dir/*.txt"` gives `(Some("sub/dir/"), "*.txt")`, `"/*.txt"` gives
/// `(Some("/"), "*.txt")`, and `"*.txt"` gives `(None, "*.txt")`. The
/// directory text keeps its trailing slash so it can be re-attached verbatim.
pub fn split_last(token: &str) -> (Option<&str>, &str) {
    match token.rfind('/') {
        Some(idx) => (Some(&token[..=idx]), &token[idx + 1..]),
        None => (None, token),
    }
}

//! treesh-glob: shell-style glob matching for directory entry names.
//!
//! Provides:
//! - **Pattern**: a compiled glob, matched against many names
//! - **contains_glob**: cheap check for glob metacharacters
//!
//! Matching is per path segment; `/` has no special meaning here.

mod pattern;

pub use pattern::Pattern;

/// Check if a string contains glob metacharacters (`*`, `?`, `[`, `]`).
///
/// ```
/// use treesh_glob::contains_glob;
/// assert!(contains_glob("*.txt"));
/// assert!(contains_glob("run[0-9]"));
/// assert!(!contains_glob("plainfile.txt"));
/// ```
pub fn contains_glob(s: &str) -> bool {
    s.contains(['*', '?', '[', ']'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_glob_checks_all_metacharacters() {
        assert!(contains_glob("a*"));
        assert!(contains_glob("a?"));
        assert!(contains_glob("[a"));
        assert!(contains_glob("a]"));
        assert!(!contains_glob("~/data/report.txt"));
        assert!(!contains_glob(""));
    }
}

//! Canonical paths: the only address form the kernel passes between layers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VfsError;

/// A normalized, `/`-rooted path.
///
/// Invariants, upheld by every constructor:
/// - starts with `/`
/// - ends with `/` only when it is exactly the root
/// - contains no empty, `.` or `..` segments
///
/// Comparison is byte-for-byte and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalPath(String);

impl CanonicalPath {
    /// The root path `/`.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Normalize any string into a canonical path.
    ///
    /// The input is treated as absolute whether or not it starts with `/`.
    /// Empty and `.` segments are dropped, `..` pops one segment and never
    /// climbs above the root.
    pub fn normalize(raw: &str) -> Self {
        let mut segments: Vec<&str> = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                s => segments.push(s),
            }
        }
        if segments.is_empty() {
            Self::root()
        } else {
            let mut out = String::with_capacity(raw.len() + 1);
            for s in segments {
                out.push('/');
                out.push_str(s);
            }
            Self(out)
        }
    }

    /// Parse an absolute path, normalizing it.
    ///
    /// Fails with `InvalidPath` for relative input or input containing NUL.
    pub fn parse(raw: &str) -> Result<Self, VfsError> {
        if !raw.starts_with('/') {
            return Err(VfsError::InvalidPath(format!("not absolute: {raw}")));
        }
        if raw.contains('\0') {
            return Err(VfsError::InvalidPath(format!("contains NUL: {raw:?}")));
        }
        Ok(Self::normalize(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Join a relative path (which may contain `.` and `..`) onto this one.
    ///
    /// An absolute `rel` replaces `self` entirely.
    pub fn join(&self, rel: &str) -> Self {
        if rel.starts_with('/') {
            Self::normalize(rel)
        } else {
            Self::normalize(&format!("{}/{}", self.0, rel))
        }
    }

    /// The parent directory. The root is its own parent.
    pub fn parent(&self) -> Self {
        match self.0.rfind('/') {
            Some(0) | None => Self::root(),
            Some(idx) => Self(self.0[..idx].to_string()),
        }
    }

    /// The last segment, or `""` for the root.
    pub fn basename(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => "",
        }
    }

    /// Iterate over the segments, root excluded.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Segment-wise prefix test: `/a/b` starts with `/a` but not with `/a/b/c`
    /// or `/a/bc`. Every path starts with the root.
    pub fn starts_with(&self, prefix: &CanonicalPath) -> bool {
        prefix.is_root()
            || self.0 == prefix.0
            || (self.0.starts_with(&prefix.0) && self.0.as_bytes().get(prefix.0.len()) == Some(&b'/'))
    }

    /// The first segment below the root, if any.
    pub fn first_component(&self) -> Option<&str> {
        self.components().next()
    }
}

impl Default for CanonicalPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CanonicalPath {
    type Err = VfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CanonicalPath {
    type Error = VfsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CanonicalPath> for String {
    fn from(path: CanonicalPath) -> Self {
        path.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "/")]
    #[case("/", "/")]
    #[case("//", "/")]
    #[case("/a/b/", "/a/b")]
    #[case("/a//b", "/a/b")]
    #[case("/a/./b", "/a/b")]
    #[case("/a/b/..", "/a")]
    #[case("/../../x", "/x")]
    #[case("a/b", "/a/b")]
    fn normalize_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(CanonicalPath::normalize(input).as_str(), expected);
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["/", "/home/alice", "/a/../b/./c/", "/x//y"] {
            let once = CanonicalPath::normalize(raw);
            let twice = CanonicalPath::normalize(once.as_str());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn parse_rejects_relative_and_nul() {
        assert!(matches!(
            CanonicalPath::parse("relative"),
            Err(VfsError::InvalidPath(_))
        ));
        assert!(matches!(
            CanonicalPath::parse("/a\0b"),
            Err(VfsError::InvalidPath(_))
        ));
        assert_eq!(CanonicalPath::parse("/a/b/").unwrap().as_str(), "/a/b");
    }

    #[test]
    fn parent_and_basename() {
        let p = CanonicalPath::normalize("/home/alice/work");
        assert_eq!(p.parent().as_str(), "/home/alice");
        assert_eq!(p.basename(), "work");
        assert_eq!(CanonicalPath::normalize("/home").parent(), CanonicalPath::root());
        assert_eq!(CanonicalPath::root().parent(), CanonicalPath::root());
        assert_eq!(CanonicalPath::root().basename(), "");
    }

    #[test]
    fn join_handles_dots_and_absolute() {
        let base = CanonicalPath::normalize("/home/alice");
        assert_eq!(base.join("..").as_str(), "/home");
        assert_eq!(base.join("./data/").as_str(), "/home/alice/data");
        assert_eq!(base.join("/etc").as_str(), "/etc");
        assert_eq!(base.join("../../../..").as_str(), "/");
    }

    #[test]
    fn starts_with_is_segment_wise() {
        let p = CanonicalPath::normalize("/bin/tools");
        assert!(p.starts_with(&CanonicalPath::root()));
        assert!(p.starts_with(&CanonicalPath::normalize("/bin")));
        assert!(p.starts_with(&p));
        assert!(!CanonicalPath::normalize("/binary").starts_with(&CanonicalPath::normalize("/bin")));
        assert!(!CanonicalPath::normalize("/bin").starts_with(&p));
    }

    #[test]
    fn components_skip_root() {
        let p = CanonicalPath::normalize("/a/b/c");
        assert_eq!(p.components().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(CanonicalPath::root().components().count(), 0);
        assert_eq!(p.first_component(), Some("a"));
    }

    #[test]
    fn serde_roundtrip_validates() {
        let json = serde_json::to_string(&CanonicalPath::normalize("/x/y")).unwrap();
        assert_eq!(json, "\"/x/y\"");
        let bad: Result<CanonicalPath, _> = serde_json::from_str("\"x/y\"");
        assert!(bad.is_err());
    }
}

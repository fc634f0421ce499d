//! Directory entry types shared by every listing provider.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    File,
    Directory,
    Link,
    /// Synthetic directory served by an overlay provider.
    OverlayDirectory,
    /// Member of an executable catalog.
    Executable,
}

impl EntryKind {
    /// True for kinds that can be listed (navigated into).
    pub fn is_dir_like(self) -> bool {
        matches!(self, EntryKind::Directory | EntryKind::OverlayDirectory)
    }
}

/// One member of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Name within the parent (never contains `/`).
    pub name: String,
    pub kind: EntryKind,
    /// Size in bytes (0 for directories).
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub owner: String,
    #[serde(default = "epoch")]
    pub modified: DateTime<Utc>,
    /// For links: the target, absolute or relative to the entry's parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_target: Option<String>,
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

impl Entry {
    fn with_kind(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            size: 0,
            owner: String::new(),
            modified: epoch(),
            link_target: None,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self::with_kind(name, EntryKind::Directory)
    }

    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            size,
            ..Self::with_kind(name, EntryKind::File)
        }
    }

    pub fn link(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            link_target: Some(target.into()),
            ..Self::with_kind(name, EntryKind::Link)
        }
    }

    pub fn overlay_directory(name: impl Into<String>) -> Self {
        Self::with_kind(name, EntryKind::OverlayDirectory)
    }

    pub fn executable(name: impl Into<String>) -> Self {
        Self::with_kind(name, EntryKind::Executable)
    }

    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn modified_at(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = modified;
        self
    }

    pub fn is_link(&self) -> bool {
        self.kind == EntryKind::Link
    }

    pub fn is_dir_like(&self) -> bool {
        self.kind.is_dir_like()
    }
}

/// Field a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Size,
    Modified,
    Owner,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortKey::Name),
            "size" => Ok(SortKey::Size),
            "modified" | "time" => Ok(SortKey::Modified),
            "owner" => Ok(SortKey::Owner),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortKey::Name => "name",
            SortKey::Size => "size",
            SortKey::Modified => "modified",
            SortKey::Owner => "owner",
        };
        f.write_str(s)
    }
}

/// Options accepted by a router listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListOptions {
    pub sort: SortKey,
    pub reverse: bool,
    /// Describe the node itself instead of listing its children.
    pub self_only: bool,
}

impl ListOptions {
    pub fn sorted_by(sort: SortKey) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    pub fn reversed(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn self_only(mut self, self_only: bool) -> Self {
        self.self_only = self_only;
        self
    }
}

/// Order entries by `key`, ascending unless `reverse`.
///
/// Ties on the chosen key fall back to name so the order is total.
pub fn sort_entries(entries: &mut [Entry], key: SortKey, reverse: bool) {
    entries.sort_by(|a, b| {
        let primary = match key {
            SortKey::Name => Ordering::Equal,
            SortKey::Size => a.size.cmp(&b.size),
            SortKey::Modified => a.modified.cmp(&b.modified),
            SortKey::Owner => a.owner.cmp(&b.owner),
        };
        let cmp = primary.then_with(|| a.name.cmp(&b.name));
        if reverse { cmp.reverse() } else { cmp }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn sort_by_each_key() {
        let t = |s| Utc.timestamp_opt(s, 0).unwrap();
        let mut entries = vec![
            Entry::file("b", 10).owned_by("zed").modified_at(t(5)),
            Entry::file("a", 30).owned_by("amy").modified_at(t(9)),
            Entry::file("c", 20).owned_by("bob").modified_at(t(1)),
        ];

        sort_entries(&mut entries, SortKey::Name, false);
        assert_eq!(names(&entries), vec!["a", "b", "c"]);

        sort_entries(&mut entries, SortKey::Size, false);
        assert_eq!(names(&entries), vec!["b", "c", "a"]);

        sort_entries(&mut entries, SortKey::Modified, false);
        assert_eq!(names(&entries), vec!["c", "b", "a"]);

        sort_entries(&mut entries, SortKey::Owner, true);
        assert_eq!(names(&entries), vec!["b", "c", "a"]);
    }

    #[test]
    fn ties_fall_back_to_name() {
        let mut entries = vec![Entry::file("y", 1), Entry::file("x", 1)];
        sort_entries(&mut entries, SortKey::Size, false);
        assert_eq!(names(&entries), vec!["x", "y"]);
    }

    #[test]
    fn entry_deserializes_with_defaults() {
        let entry: Entry =
            serde_json::from_str(r#"{"name":"l","kind":"link","link_target":"../x"}"#).unwrap();
        assert!(entry.is_link());
        assert_eq!(entry.link_target.as_deref(), Some("../x"));
        assert_eq!(entry.size, 0);

        let overlay: Entry =
            serde_json::from_str(r#"{"name":"bin","kind":"overlay-directory"}"#).unwrap();
        assert!(overlay.is_dir_like());
    }
}

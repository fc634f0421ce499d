//! Synthetic overlay provider: the executable catalog.
//!
//! The catalog is mounted at a fixed path (`/bin` by default). It serves:
//!
//! - the mount point itself, listing registered executables
//! - every non-root ancestor of the mount point, as a chain of synthetic
//!   directories leading to it
//!
//! Nothing is fetched over the network; the catalog is filled by whoever
//! builds the session (config, plugin discovery, tests).

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use treesh_types::{CanonicalPath, Entry};

use super::traits::{ListingProvider, OverlayProvider, ProviderError};

/// Executable catalog mounted at a fixed path.
#[derive(Debug)]
pub struct CatalogProvider {
    mount: CanonicalPath,
    executables: RwLock<BTreeMap<String, Entry>>,
}

impl CatalogProvider {
    /// Create an empty catalog. A root mount is not allowed, so `/` falls
    /// back to `/bin`.
    pub fn new(mount: CanonicalPath) -> Self {
        let mount = if mount.is_root() {
            CanonicalPath::normalize("/bin")
        } else {
            mount
        };
        Self {
            mount,
            executables: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a catalog pre-filled with executables.
    pub fn with_executables<I, S>(mount: CanonicalPath, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let catalog = Self::new(mount);
        for name in names {
            catalog.register(Entry::executable(name));
        }
        catalog
    }

    /// Add or replace an executable. Returns false for names that cannot be
    /// directory members.
    pub fn register(&self, entry: Entry) -> bool {
        if entry.name.is_empty() || entry.name.contains('/') {
            return false;
        }
        self.executables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entry.name.clone(), entry);
        true
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.executables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }
}

#[async_trait]
impl ListingProvider for CatalogProvider {
    fn name(&self) -> &str {
        "catalog"
    }

    async fn list(&self, path: &CanonicalPath) -> Result<Vec<Entry>, ProviderError> {
        if *path == self.mount {
            return Ok(self
                .executables
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .values()
                .cloned()
                .collect());
        }

        if !path.is_root() && self.mount.starts_with(path) {
            // Ancestor: show the next segment toward the mount
            let depth = path.components().count();
            let next = self.mount.components().nth(depth).unwrap_or_default();
            return Ok(vec![Entry::overlay_directory(next)]);
        }

        if path.starts_with(&self.mount) {
            let name = path.components().nth(self.mount.components().count()).unwrap_or_default();
            let known = self
                .executables
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains_key(name);
            return Err(if known && path.parent() == self.mount {
                ProviderError::NotADirectory(path.to_string())
            } else {
                ProviderError::NotFound(path.to_string())
            });
        }

        Err(ProviderError::NotFound(path.to_string()))
    }
}

impl OverlayProvider for CatalogProvider {
    fn mount(&self) -> &CanonicalPath {
        &self.mount
    }

    /// The mount, anything under it, or a non-root ancestor of it.
    fn claims(&self, path: &CanonicalPath) -> bool {
        path.starts_with(&self.mount) || (!path.is_root() && self.mount.starts_with(path))
    }

    fn root_entry(&self) -> Entry {
        Entry::overlay_directory(self.mount.first_component().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treesh_types::EntryKind;

    fn p(s: &str) -> CanonicalPath {
        CanonicalPath::normalize(s)
    }

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[tokio::test]
    async fn lists_registered_executables() {
        let catalog = CatalogProvider::with_executables(p("/bin"), ["pl-dircopy", "pl-fshack"]);
        let entries = catalog.list(&p("/bin")).await.unwrap();
        assert_eq!(names(&entries), vec!["pl-dircopy", "pl-fshack"]);
        assert!(entries.iter().all(|e| e.kind == EntryKind::Executable));
    }

    #[tokio::test]
    async fn ancestors_lead_to_the_mount() {
        let catalog = CatalogProvider::new(p("/usr/local/bin"));
        assert_eq!(names(&catalog.list(&p("/usr")).await.unwrap()), vec!["local"]);
        let local = catalog.list(&p("/usr/local")).await.unwrap();
        assert_eq!(names(&local), vec!["bin"]);
        assert_eq!(local[0].kind, EntryKind::OverlayDirectory);
        assert_eq!(catalog.root_entry().name, "usr");
    }

    #[tokio::test]
    async fn executables_are_not_directories() {
        let catalog = CatalogProvider::with_executables(p("/bin"), ["tool"]);
        assert!(matches!(
            catalog.list(&p("/bin/tool")).await,
            Err(ProviderError::NotADirectory(_))
        ));
        assert!(matches!(
            catalog.list(&p("/bin/ghost")).await,
            Err(ProviderError::NotFound(_))
        ));
    }

    #[test]
    fn claims_mount_subtree_and_ancestors() {
        let catalog = CatalogProvider::new(p("/usr/bin"));
        assert!(catalog.claims(&p("/usr/bin")));
        assert!(catalog.claims(&p("/usr/bin/tool")));
        assert!(catalog.claims(&p("/usr")));
        assert!(!catalog.claims(&CanonicalPath::root()));
        assert!(!catalog.claims(&p("/usr/lib")));
        assert!(!catalog.claims(&p("/home")));
    }

    #[test]
    fn register_and_unregister() {
        let catalog = CatalogProvider::new(p("/bin"));
        assert!(catalog.register(Entry::executable("a")));
        assert!(!catalog.register(Entry::executable("a/b")));
        assert!(!catalog.register(Entry::executable("")));
        assert!(catalog.unregister("a"));
        assert!(!catalog.unregister("a"));
    }

    #[test]
    fn root_mount_is_refused() {
        assert_eq!(CatalogProvider::new(CanonicalPath::root()).mount().as_str(), "/bin");
    }
}

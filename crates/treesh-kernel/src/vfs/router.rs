//! VFS router: dispatch, cache-first listing, root injection, sorting.
//!
//! Every listing goes through [`VfsRouter::list`]. The router:
//!
//! 1. Consults the freshness cache; a hit is served whatever its age.
//! 2. On a miss, picks the provider from the routing table (the overlay
//!    with the longest claiming mount, else the remote tree), calls it and
//!    caches the result.
//! 3. At the root, injects one synthetic entry per overlay mount.
//! 4. Sorts by the requested field.
//!
//! Failures push exactly one message onto the session [`ErrorLog`] here,
//! where they are detected. Callers propagate with `?` and do not push again.

use std::sync::Arc;

use treesh_types::{CanonicalPath, Entry, ErrorLog, ListOptions, VfsError, VfsResult, sort_entries};

use super::traits::{ListingProvider, OverlayProvider};
use crate::cache::FreshnessCache;

/// A listing together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub entries: Vec<Entry>,
    /// Served from cache and the cache considers it stale.
    pub stale: bool,
    /// Served from cache without a provider call.
    pub from_cache: bool,
}

/// Routes listings to the overlay or remote provider through the cache.
pub struct VfsRouter {
    /// Overlay routing table, checked before falling back to `remote`.
    overlays: Vec<Arc<dyn OverlayProvider>>,
    remote: Arc<dyn ListingProvider>,
    cache: Arc<dyn FreshnessCache>,
    errors: ErrorLog,
}

impl std::fmt::Debug for VfsRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VfsRouter")
            .field(
                "overlays",
                &self.overlays.iter().map(|o| o.mount().as_str()).collect::<Vec<_>>(),
            )
            .field("remote", &self.remote.name())
            .finish()
    }
}

impl VfsRouter {
    pub fn new(
        remote: Arc<dyn ListingProvider>,
        cache: Arc<dyn FreshnessCache>,
        errors: ErrorLog,
    ) -> Self {
        Self {
            overlays: Vec::new(),
            remote,
            cache,
            errors,
        }
    }

    /// Add an overlay to the routing table.
    pub fn with_overlay(mut self, overlay: Arc<dyn OverlayProvider>) -> Self {
        self.mount_overlay(overlay);
        self
    }

    /// Add an overlay, replacing any overlay already at the same mount.
    pub fn mount_overlay(&mut self, overlay: Arc<dyn OverlayProvider>) {
        self.overlays.retain(|o| o.mount() != overlay.mount());
        self.overlays.push(overlay);
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    pub fn cache(&self) -> &Arc<dyn FreshnessCache> {
        &self.cache
    }

    /// Name of the provider that serves `path`.
    pub fn provider_name(&self, path: &CanonicalPath) -> &str {
        match self.overlay_for(path) {
            Some(overlay) => overlay.name(),
            None => self.remote.name(),
        }
    }

    fn overlay_for(&self, path: &CanonicalPath) -> Option<&Arc<dyn OverlayProvider>> {
        self.overlays
            .iter()
            .filter(|o| o.claims(path))
            .max_by_key(|o| o.mount().as_str().len())
    }

    /// List `path`, honoring sort, reverse and self-only options.
    pub async fn list(&self, path: &CanonicalPath, opts: ListOptions) -> VfsResult<Vec<Entry>> {
        Ok(self.list_with_freshness(path, opts).await?.entries)
    }

    /// Like [`list`](Self::list), also reporting cache provenance so the
    /// caller can schedule a refresh.
    #[tracing::instrument(level = "debug", skip(self, path, opts), fields(path = %path))]
    pub async fn list_with_freshness(
        &self,
        path: &CanonicalPath,
        opts: ListOptions,
    ) -> VfsResult<Listing> {
        if opts.self_only {
            return self.describe(path, true).await;
        }
        let mut listing = self.children(path, true).await?;
        sort_entries(&mut listing.entries, opts.sort, opts.reverse);
        Ok(listing)
    }

    /// Re-fetch `path` from its provider, replacing any cached listing.
    pub async fn refresh(&self, path: &CanonicalPath, opts: ListOptions) -> VfsResult<Vec<Entry>> {
        let mut entries = self.fetch(path, true).await?;
        if path.is_root() {
            self.inject_overlays(&mut entries);
        }
        sort_entries(&mut entries, opts.sort, opts.reverse);
        Ok(entries)
    }

    /// List without touching the error log. For best-effort walkers that
    /// swallow failures.
    pub(crate) async fn list_quiet(&self, path: &CanonicalPath) -> VfsResult<Vec<Entry>> {
        Ok(self.children(path, false).await?.entries)
    }

    /// Drop cached listings at and below `path`, or everything for `None`.
    pub fn invalidate(&self, path: Option<&CanonicalPath>) {
        self.cache.invalidate(path);
    }

    pub fn mark_dirty(&self, path: &CanonicalPath) {
        self.cache.mark_dirty(path);
    }

    /// Unsorted children of `path`, cache first.
    async fn children(&self, path: &CanonicalPath, log: bool) -> VfsResult<Listing> {
        let mut listing = match self.cache.get(path) {
            Some(hit) => {
                let stale = self.cache.is_stale(&hit);
                tracing::debug!(path = %path, stale, "cache hit");
                Listing {
                    entries: hit.entries,
                    stale,
                    from_cache: true,
                }
            }
            None => {
                tracing::debug!(path = %path, "cache miss");
                Listing {
                    entries: self.fetch(path, log).await?,
                    stale: false,
                    from_cache: false,
                }
            }
        };
        if path.is_root() {
            self.inject_overlays(&mut listing.entries);
        }
        Ok(listing)
    }

    /// Call the routed provider and cache a successful result.
    async fn fetch(&self, path: &CanonicalPath, log: bool) -> VfsResult<Vec<Entry>> {
        let result = match self.overlay_for(path) {
            Some(overlay) => overlay
                .list(path)
                .await
                .map_err(|e| e.into_vfs(overlay.name(), path)),
            None => self
                .remote
                .list(path)
                .await
                .map_err(|e| e.into_vfs(self.remote.name(), path)),
        };

        match result {
            Ok(entries) => {
                self.cache.set(path, entries.clone());
                Ok(entries)
            }
            Err(err) => Err(self.fail(err, log)),
        }
    }

    /// Add one synthetic entry per overlay mount, shadowing any remote
    /// entry of the same name.
    fn inject_overlays(&self, entries: &mut Vec<Entry>) {
        for overlay in &self.overlays {
            let mount_entry = overlay.root_entry();
            entries.retain(|e| e.name != mount_entry.name);
            entries.push(mount_entry);
        }
    }

    /// Describe `path` itself by finding it in its parent's listing.
    async fn describe(&self, path: &CanonicalPath, log: bool) -> VfsResult<Listing> {
        if path.is_root() {
            return Ok(Listing {
                entries: vec![Entry::directory("/")],
                stale: false,
                from_cache: false,
            });
        }

        let parent = self.children(&path.parent(), log).await?;
        match parent.entries.into_iter().find(|e| e.name == path.basename()) {
            Some(entry) => Ok(Listing {
                entries: vec![entry],
                stale: parent.stale,
                from_cache: parent.from_cache,
            }),
            None => Err(self.fail(VfsError::not_found(path), log)),
        }
    }

    fn fail(&self, err: VfsError, log: bool) -> VfsError {
        tracing::debug!(error = %err, logged = log, "listing failed");
        if log {
            self.errors.push(err.clone());
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ListingCache;
    use crate::vfs::{CatalogProvider, MemoryStore, ProviderError, RemoteTreeProvider};
    use treesh_types::{EntryKind, SortKey};

    fn p(s: &str) -> CanonicalPath {
        CanonicalPath::normalize(s)
    }

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    fn router_over(store: Arc<MemoryStore>) -> VfsRouter {
        let remote = Arc::new(RemoteTreeProvider::new(store));
        let catalog = Arc::new(CatalogProvider::with_executables(p("/bin"), ["pl-a", "pl-b"]));
        VfsRouter::new(remote, Arc::new(ListingCache::default()), ErrorLog::new())
            .with_overlay(catalog)
    }

    #[tokio::test]
    async fn dispatches_overlay_and_remote() {
        let store = Arc::new(MemoryStore::new());
        store.add_file("/data/a.txt", 1);
        let router = router_over(store.clone());

        assert_eq!(router.provider_name(&p("/bin")), "catalog");
        assert_eq!(router.provider_name(&p("/data")), "remote");

        let bin = router.list(&p("/bin"), ListOptions::default()).await.unwrap();
        assert_eq!(names(&bin), vec!["pl-a", "pl-b"]);
        assert_eq!(store.calls(), 0);

        let data = router.list(&p("/data"), ListOptions::default()).await.unwrap();
        assert_eq!(names(&data), vec!["a.txt"]);
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn second_listing_comes_from_cache() {
        let store = Arc::new(MemoryStore::new());
        store.add_file("/data/a.txt", 1);
        let router = router_over(store.clone());

        let first = router.list_with_freshness(&p("/data"), ListOptions::default()).await.unwrap();
        assert!(!first.from_cache);
        let second = router.list_with_freshness(&p("/data"), ListOptions::default()).await.unwrap();
        assert!(second.from_cache);
        assert!(!second.stale);
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn dirty_hit_is_served_but_flagged() {
        let store = Arc::new(MemoryStore::new());
        store.add_file("/data/a.txt", 1);
        let router = router_over(store.clone());
        router.list(&p("/data"), ListOptions::default()).await.unwrap();

        store.add_file("/data/b.txt", 1);
        router.mark_dirty(&p("/data"));
        let listing = router.list_with_freshness(&p("/data"), ListOptions::default()).await.unwrap();
        assert!(listing.stale);
        assert_eq!(names(&listing.entries), vec!["a.txt"]);
        assert_eq!(store.calls(), 1);

        let fresh = router.refresh(&p("/data"), ListOptions::default()).await.unwrap();
        assert_eq!(names(&fresh), vec!["a.txt", "b.txt"]);
        let after = router.list_with_freshness(&p("/data"), ListOptions::default()).await.unwrap();
        assert!(!after.stale);
    }

    #[tokio::test]
    async fn root_gets_exactly_one_mount_entry() {
        let store = Arc::new(MemoryStore::new());
        store.add_dir("/home");
        store.add_dir("/bin"); // shadowed by the overlay
        let router = router_over(store);

        for _ in 0..3 {
            let root = router.list(&CanonicalPath::root(), ListOptions::default()).await.unwrap();
            let mounts: Vec<_> = root.iter().filter(|e| e.kind == EntryKind::OverlayDirectory).collect();
            assert_eq!(mounts.len(), 1);
            assert_eq!(names(&root), vec!["bin", "home"]);
        }
    }

    #[tokio::test]
    async fn root_mount_entry_respects_sort_order() {
        let store = Arc::new(MemoryStore::new());
        store.add_file("/aaa", 5);
        store.add_file("/zzz", 0);
        let router = router_over(store);

        let by_name_rev = router
            .list(&CanonicalPath::root(), ListOptions::sorted_by(SortKey::Name).reversed(true))
            .await
            .unwrap();
        assert_eq!(names(&by_name_rev), vec!["zzz", "bin", "aaa"]);

        let by_size = router
            .list(&CanonicalPath::root(), ListOptions::sorted_by(SortKey::Size))
            .await
            .unwrap();
        assert_eq!(names(&by_size), vec!["bin", "zzz", "aaa"]);
    }

    #[tokio::test]
    async fn provider_failure_is_logged_once_and_not_cached() {
        let store = Arc::new(MemoryStore::new());
        store.add_dir("/data");
        store.fail_on("/data", ProviderError::Transport("connection reset".into()));
        let router = router_over(store.clone());

        let err = router.list(&p("/data"), ListOptions::default()).await.unwrap_err();
        assert_eq!(err, VfsError::provider("remote", "transport error: connection reset"));
        assert_eq!(router.errors().len(), 1);
        assert!(router.cache().get(&p("/data")).is_none());

        store.clear_failures();
        assert!(router.list(&p("/data"), ListOptions::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn self_only_describes_the_node() {
        let store = Arc::new(MemoryStore::new());
        store.add_file("/data/a.txt", 42);
        let router = router_over(store);

        let opts = ListOptions::default().self_only(true);
        let found = router.list(&p("/data/a.txt"), opts).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].size, 42);

        let root = router.list(&CanonicalPath::root(), opts).await.unwrap();
        assert_eq!(root[0].kind, EntryKind::Directory);

        let bin = router.list(&p("/bin"), opts).await.unwrap();
        assert_eq!(bin[0].kind, EntryKind::OverlayDirectory);
    }

    #[tokio::test]
    async fn self_only_missing_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        store.add_dir("/data");
        let router = router_over(store);

        let err = router
            .list(&p("/data/ghost"), ListOptions::default().self_only(true))
            .await
            .unwrap_err();
        assert_eq!(err, VfsError::not_found("/data/ghost"));
        assert_eq!(router.errors().pop(), Some(err));
        assert!(router.errors().is_empty());
    }

    #[tokio::test]
    async fn quiet_listing_does_not_log() {
        let router = router_over(Arc::new(MemoryStore::new()));
        assert!(router.list_quiet(&p("/missing")).await.is_err());
        assert!(router.errors().is_empty());
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let store = Arc::new(MemoryStore::new());
        store.add_dir("/data");
        let router = router_over(store.clone());
        router.list(&p("/data"), ListOptions::default()).await.unwrap();
        router.invalidate(Some(&p("/data")));
        router.list(&p("/data"), ListOptions::default()).await.unwrap();
        assert_eq!(store.calls(), 2);
    }
}

//! Freshness cache for directory listings.
//!
//! The router consults the cache before any provider call. A hit is served
//! as-is; whether it is stale is reported back to the caller, who decides
//! whether to refresh. The cache never fetches anything itself.
//!
//! Staleness has two sources: age beyond a path-dependent TTL, or an
//! explicit dirty mark set by a mutating command.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use treesh_types::{CanonicalPath, Entry};

/// A cached listing.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub path: CanonicalPath,
    pub entries: Vec<Entry>,
    pub fetched_at: Instant,
    pub dirty: bool,
}

impl CacheEntry {
    pub fn new(path: CanonicalPath, entries: Vec<Entry>) -> Self {
        Self {
            path,
            entries,
            fetched_at: Instant::now(),
            dirty: false,
        }
    }

    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    /// Dirty, or older than `ttl`.
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.dirty || self.age() >= ttl
    }
}

/// Keyed store of prior listings.
///
/// Implementations own their storage and staleness policy; callers only
/// see these operations.
pub trait FreshnessCache: Send + Sync {
    fn get(&self, path: &CanonicalPath) -> Option<CacheEntry>;

    fn set(&self, path: &CanonicalPath, entries: Vec<Entry>);

    /// Flag a listing as out of date without dropping it.
    fn mark_dirty(&self, path: &CanonicalPath);

    /// Drop a listing and everything cached beneath it, or the whole cache
    /// for `None`.
    fn invalidate(&self, path: Option<&CanonicalPath>);

    /// Whether a hit should be reported as stale.
    fn is_stale(&self, entry: &CacheEntry) -> bool;
}

/// Path-dependent time-to-live. The longest matching prefix rule wins.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    default: Duration,
    rules: Vec<(CanonicalPath, Duration)>,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl TtlPolicy {
    pub fn new(default: Duration) -> Self {
        Self {
            default,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, prefix: CanonicalPath, ttl: Duration) -> Self {
        self.rules.push((prefix, ttl));
        self
    }

    pub fn ttl_for(&self, path: &CanonicalPath) -> Duration {
        self.rules
            .iter()
            .filter(|(prefix, _)| path.starts_with(prefix))
            .max_by_key(|(prefix, _)| prefix.as_str().len())
            .map(|(_, ttl)| *ttl)
            .unwrap_or(self.default)
    }
}

/// In-process listing cache.
#[derive(Debug, Default)]
pub struct ListingCache {
    entries: RwLock<HashMap<CanonicalPath, CacheEntry>>,
    policy: TtlPolicy,
}

impl ListingCache {
    pub fn new(policy: TtlPolicy) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            policy,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FreshnessCache for ListingCache {
    fn get(&self, path: &CanonicalPath) -> Option<CacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    fn set(&self, path: &CanonicalPath, entries: Vec<Entry>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.clone(), CacheEntry::new(path.clone(), entries));
    }

    fn mark_dirty(&self, path: &CanonicalPath) {
        if let Some(entry) = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(path)
        {
            entry.dirty = true;
        }
    }

    fn invalidate(&self, path: Option<&CanonicalPath>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match path {
            None => entries.clear(),
            Some(prefix) => entries.retain(|cached, _| !cached.starts_with(prefix)),
        }
    }

    fn is_stale(&self, entry: &CacheEntry) -> bool {
        entry.is_stale(self.policy.ttl_for(&entry.path))
    }
}

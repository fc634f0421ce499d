//! In-memory object store.
//!
//! Stands in for the network client in tests and in the `treesh` binary,
//! which loads it from a JSON snapshot. Listings follow links the way a
//! server-side tree would, so logical paths through a link list the
//! target's children.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use treesh_types::{CanonicalPath, Entry};

use super::traits::{ProviderError, StoreClient};

/// Bound on link substitutions while walking a path.
const MAX_LINK_HOPS: usize = 40;

#[derive(Debug, Clone)]
enum Node {
    File { size: u64 },
    Directory,
    Link { target: String },
}

#[derive(Debug, Clone)]
struct Stored {
    node: Node,
    owner: String,
    modified: DateTime<Utc>,
}

impl Stored {
    fn new(node: Node) -> Self {
        Self {
            node,
            owner: String::new(),
            modified: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// In-memory tree implementing [`StoreClient`].
///
/// Thread-safe via internal `RwLock`. Counts `list` calls so tests can
/// assert whether the network would have been touched.
#[derive(Debug)]
pub struct MemoryStore {
    nodes: RwLock<HashMap<CanonicalPath, Stored>>,
    failures: RwLock<HashMap<CanonicalPath, ProviderError>>,
    calls: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a store containing only the root directory.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(CanonicalPath::root(), Stored::new(Node::Directory));
        Self {
            nodes: RwLock::new(nodes),
            failures: RwLock::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Build a store from a JSON snapshot of nested nodes.
    ///
    /// ```json
    /// {"type": "directory", "children": {
    ///     "data": {"type": "directory", "owner": "alice", "children": {
    ///         "a.txt": {"type": "file", "size": 12},
    ///         "latest": {"type": "link", "target": "a.txt"}
    ///     }}
    /// }}
    /// ```
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let root: SnapshotNode = serde_json::from_str(json)?;
        let store = Self::new();
        store.load(&CanonicalPath::root(), root);
        Ok(store)
    }

    fn load(&self, path: &CanonicalPath, node: SnapshotNode) {
        match node {
            SnapshotNode::File { size, owner, modified } => {
                self.insert(path, Node::File { size }, owner, modified);
            }
            SnapshotNode::Link { target, owner, modified } => {
                self.insert(path, Node::Link { target }, owner, modified);
            }
            SnapshotNode::Directory { owner, modified, children } => {
                self.insert(path, Node::Directory, owner, modified);
                for (name, child) in children {
                    self.load(&path.join(&name), child);
                }
            }
        }
    }

    fn insert(
        &self,
        path: &CanonicalPath,
        node: Node,
        owner: Option<String>,
        modified: Option<DateTime<Utc>>,
    ) {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        // Ensure parents exist
        let mut parent = path.parent();
        while !nodes.contains_key(&parent) {
            nodes.insert(parent.clone(), Stored::new(Node::Directory));
            parent = parent.parent();
        }
        let mut stored = Stored::new(node);
        if let Some(owner) = owner {
            stored.owner = owner;
        }
        if let Some(modified) = modified {
            stored.modified = modified;
        }
        nodes.insert(path.clone(), stored);
    }

    pub fn add_dir(&self, path: &str) {
        self.insert(&CanonicalPath::normalize(path), Node::Directory, None, None);
    }

    pub fn add_file(&self, path: &str, size: u64) {
        self.insert(&CanonicalPath::normalize(path), Node::File { size }, None, None);
    }

    /// Add a link. `target` may be absolute or relative to the link's parent.
    pub fn add_link(&self, path: &str, target: &str) {
        let node = Node::Link {
            target: target.to_string(),
        };
        self.insert(&CanonicalPath::normalize(path), node, None, None);
    }

    pub fn set_owner(&self, path: &str, owner: &str) {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(stored) = nodes.get_mut(&CanonicalPath::normalize(path)) {
            stored.owner = owner.to_string();
        }
    }

    pub fn set_modified(&self, path: &str, modified: DateTime<Utc>) {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(stored) = nodes.get_mut(&CanonicalPath::normalize(path)) {
            stored.modified = modified;
        }
    }

    /// Remove a node and everything beneath it.
    pub fn remove(&self, path: &str) {
        let path = CanonicalPath::normalize(path);
        self.nodes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|p, _| p.is_root() || !p.starts_with(&path));
    }

    /// Make every listing of `path` fail with `err`.
    pub fn fail_on(&self, path: &str, err: ProviderError) {
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(CanonicalPath::normalize(path), err);
    }

    pub fn clear_failures(&self) {
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of `list` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Follow links along `path` until it names a stored non-link node.
    fn locate(
        nodes: &HashMap<CanonicalPath, Stored>,
        path: &CanonicalPath,
    ) -> Result<CanonicalPath, ProviderError> {
        let mut pending: Vec<String> = path.components().map(String::from).collect();
        pending.reverse();
        let mut current = CanonicalPath::root();
        let mut hops = 0;

        while let Some(component) = pending.pop() {
            let next = current.join(&component);
            match nodes.get(&next).map(|s| &s.node) {
                None => return Err(ProviderError::NotFound(path.to_string())),
                Some(Node::Link { target }) => {
                    hops += 1;
                    if hops > MAX_LINK_HOPS {
                        return Err(ProviderError::Malformed(format!(
                            "{path}: too many levels of links"
                        )));
                    }
                    // Re-walk the target from the root
                    let resolved = current.join(target);
                    let mut rest: Vec<String> = resolved.components().map(String::from).collect();
                    rest.reverse();
                    pending.extend(rest);
                    current = CanonicalPath::root();
                }
                Some(_) => current = next,
            }
        }
        Ok(current)
    }

    fn children(nodes: &HashMap<CanonicalPath, Stored>, dir: &CanonicalPath) -> Vec<Entry> {
        nodes
            .iter()
            .filter(|(p, _)| !p.is_root() && p.parent() == *dir)
            .map(|(p, stored)| {
                let entry = match &stored.node {
                    Node::File { size } => Entry::file(p.basename(), *size),
                    Node::Directory => Entry::directory(p.basename()),
                    Node::Link { target } => Entry::link(p.basename(), target.clone()),
                };
                entry
                    .owned_by(stored.owner.clone())
                    .modified_at(stored.modified)
            })
            .collect()
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn list(&self, path: &CanonicalPath) -> Result<Vec<Entry>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self
            .failures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return Err(err.clone());
        }

        let nodes = self.nodes.read().unwrap_or_else(PoisonError::into_inner);
        let dir = Self::locate(&nodes, path)?;
        match nodes.get(&dir).map(|s| &s.node) {
            Some(Node::Directory) => Ok(Self::children(&nodes, &dir)),
            Some(_) => Err(ProviderError::NotADirectory(path.to_string())),
            None => Err(ProviderError::NotFound(path.to_string())),
        }
    }
}

/// JSON snapshot node.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum SnapshotNode {
    File {
        #[serde(default)]
        size: u64,
        owner: Option<String>,
        modified: Option<DateTime<Utc>>,
    },
    Directory {
        owner: Option<String>,
        modified: Option<DateTime<Utc>>,
        #[serde(default)]
        children: BTreeMap<String, SnapshotNode>,
    },
    Link {
        target: String,
        owner: Option<String>,
        modified: Option<DateTime<Utc>>,
    },
}

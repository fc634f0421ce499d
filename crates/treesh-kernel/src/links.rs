//! Physical-mode link resolution.
//!
//! Walks a canonical path from the root, one component at a time, listing
//! each parent through the router and substituting link targets as they
//! are met. Absolute targets replace the accumulated path; relative ones
//! are joined to the parent.
//!
//! The walk is best effort. A parent that cannot be listed is passed
//! through as typed and the walk carries on. It consumes each component
//! once, so link cycles cannot loop, but links pointing at their own
//! ancestors can yield a wrong physical path.

use treesh_types::CanonicalPath;

use crate::vfs::VfsRouter;

/// Outcome of a link walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkWalk {
    /// The dereferenced path.
    pub path: CanonicalPath,
    /// Links met on the way whose target was missing or empty. They are
    /// kept as typed.
    pub unresolved: Vec<CanonicalPath>,
}

/// Dereference every link along `path`.
pub async fn resolve_links(router: &VfsRouter, path: &CanonicalPath) -> CanonicalPath {
    walk(router, path).await.path
}

/// Dereference every link along `path`, reporting links that could not be
/// followed.
///
/// Listings go through the router's cache but never reach the session error
/// log: a degraded step is logged with `tracing` and otherwise swallowed.
pub async fn walk(router: &VfsRouter, path: &CanonicalPath) -> LinkWalk {
    let mut current = CanonicalPath::root();
    let mut unresolved = Vec::new();

    for component in path.components() {
        let literal = current.join(component);

        let entries = match router.list_quiet(&current).await {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(parent = %current, error = %err, "link walk continuing past unlistable parent");
                current = literal;
                continue;
            }
        };

        let link = entries
            .into_iter()
            .find(|e| e.name == component && e.is_link());

        current = match link {
            Some(entry) => match entry.link_target.filter(|t| !t.is_empty()) {
                Some(target) => {
                    let next = current.join(&target);
                    tracing::trace!(link = %literal, target = %next, "followed link");
                    next
                }
                None => {
                    tracing::warn!(link = %literal, "link has no target");
                    unresolved.push(literal.clone());
                    literal
                }
            },
            None => literal,
        };
    }

    LinkWalk {
        path: current,
        unresolved,
    }
}

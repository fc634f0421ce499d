//! Listing provider backed by the remote object store.

use std::sync::Arc;

use async_trait::async_trait;

use treesh_types::{CanonicalPath, Entry};

use super::traits::{ListingProvider, ProviderError, StoreClient};

/// Serves every path not claimed by an overlay, through a [`StoreClient`].
///
/// Responses are checked before they reach the router: an entry with an
/// empty name, a name containing `/`, or a `.`/`..` name is a malformed
/// response rather than something to list.
pub struct RemoteTreeProvider {
    client: Arc<dyn StoreClient>,
}

impl RemoteTreeProvider {
    pub fn new(client: Arc<dyn StoreClient>) -> Self {
        Self { client }
    }

    fn check_names(path: &CanonicalPath, entries: &[Entry]) -> Result<(), ProviderError> {
        for entry in entries {
            let bad = entry.name.is_empty()
                || entry.name == "."
                || entry.name == ".."
                || entry.name.contains('/');
            if bad {
                return Err(ProviderError::Malformed(format!(
                    "{}: invalid entry name {:?}",
                    path, entry.name
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for RemoteTreeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTreeProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl ListingProvider for RemoteTreeProvider {
    fn name(&self) -> &str {
        "remote"
    }

    async fn list(&self, path: &CanonicalPath) -> Result<Vec<Entry>, ProviderError> {
        tracing::debug!(path = %path, "remote listing");
        let entries = self.client.list(path).await?;
        Self::check_names(path, &entries)?;
        Ok(entries)
    }
}

//! Core listing traits and the provider error type.

use async_trait::async_trait;
use thiserror::Error;

use treesh_types::{CanonicalPath, Entry, VfsError};

/// Errors raised by listing providers and store clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Convert into the kernel taxonomy, attributing faults to `provider`.
    pub fn into_vfs(self, provider: &str, path: &CanonicalPath) -> VfsError {
        match self {
            ProviderError::NotFound(_) => VfsError::not_found(path),
            ProviderError::NotADirectory(_) => VfsError::NotADirectory(path.to_string()),
            other => VfsError::provider(provider, other.to_string()),
        }
    }
}

/// Something that can list a directory by canonical path.
///
/// Providers return entries in whatever order they like; ordering is the
/// router's job.
#[async_trait]
pub trait ListingProvider: Send + Sync {
    /// Short name used in error messages and logs.
    fn name(&self) -> &str;

    /// List the children of `path`.
    async fn list(&self, path: &CanonicalPath) -> Result<Vec<Entry>, ProviderError>;
}

/// Client for the remote object store.
///
/// This is the seam to the network client: authentication, retries and
/// timeouts live on the other side of it.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// List the children of a remote directory.
    async fn list(&self, path: &CanonicalPath) -> Result<Vec<Entry>, ProviderError>;
}

/// A provider mounted at a fixed path that takes precedence over the
/// remote tree for the paths it claims.
pub trait OverlayProvider: ListingProvider {
    /// Where the overlay is mounted.
    fn mount(&self) -> &CanonicalPath;

    /// True if `path` should be listed by this overlay.
    fn claims(&self, path: &CanonicalPath) -> bool;

    /// The synthetic entry shown in root listings.
    fn root_entry(&self) -> Entry;
}

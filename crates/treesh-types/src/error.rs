//! Error taxonomy and the session error log.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

/// Result type for every kernel layer.
pub type VfsResult<T> = Result<T, VfsError>;

/// Failures surfaced by path resolution and listing.
///
/// A wildcard with no matches is not an error and has no variant here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VfsError {
    #[error("{0}: no such file or directory")]
    NotFound(String),
    #[error("{0}: not a directory")]
    NotADirectory(String),
    #[error("{provider}: {message}")]
    Provider { provider: String, message: String },
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

impl VfsError {
    pub fn not_found(path: impl ToString) -> Self {
        Self::NotFound(path.to_string())
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, VfsError::NotFound(_))
    }
}

/// Append/pop stack of user-facing failures.
///
/// One message per failure, pushed by the layer that detected it. The
/// command boundary pops it for display. Clones share the same stack.
#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    inner: Arc<Mutex<Vec<VfsError>>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<VfsError>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, err: VfsError) {
        self.lock().push(err);
    }

    /// Remove and return the most recent error.
    pub fn pop(&self) -> Option<VfsError> {
        self.lock().pop()
    }

    /// Remove and return every error, oldest first.
    pub fn drain(&self) -> Vec<VfsError> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

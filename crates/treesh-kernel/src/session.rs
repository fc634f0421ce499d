//! Shell session: working directory, addressing mode and the router.
//!
//! The session is the explicit context every path operation runs in. It
//! owns the addressing mode (changed only through [`Session::set_mode`]),
//! the working directory and its predecessor (for `cd -`), and the error log
//! shared with the router.

use std::sync::Arc;

use treesh_types::{
    AddressingMode, CanonicalPath, Entry, ErrorLog, ListOptions, PathContext, VfsError, VfsResult,
};

use crate::cache::ListingCache;
use crate::config::ShellConfig;
use crate::expand::Expander;
use crate::lexer::Word;
use crate::links;
use crate::paths;
use crate::vfs::{CatalogProvider, RemoteTreeProvider, StoreClient, VfsRouter};

/// One interactive session.
#[derive(Debug)]
pub struct Session {
    ctx: PathContext,
    prev_cwd: Option<CanonicalPath>,
    mode: AddressingMode,
    router: Arc<VfsRouter>,
    errors: ErrorLog,
    listing: ListOptions,
}

impl Session {
    /// Create a session over an existing router. The session shares the
    /// router's error log.
    pub fn new(router: Arc<VfsRouter>, ctx: PathContext, mode: AddressingMode) -> Self {
        let errors = router.errors().clone();
        Self {
            ctx,
            prev_cwd: None,
            mode,
            router,
            errors,
            listing: ListOptions::default(),
        }
    }

    /// Wire a full session from configuration: catalog overlay, remote tree
    /// over `store`, listing cache with the configured TTLs. Starts in the
    /// user's home directory.
    pub fn from_config(config: &ShellConfig, store: Arc<dyn StoreClient>) -> Self {
        let catalog = CatalogProvider::with_executables(
            CanonicalPath::normalize(&config.overlay.mount),
            config.overlay.executables.iter().cloned(),
        );
        let router = VfsRouter::new(
            Arc::new(RemoteTreeProvider::new(store)),
            Arc::new(ListingCache::new(config.ttl_policy())),
            ErrorLog::new(),
        )
        .with_overlay(Arc::new(catalog));

        let mut ctx = PathContext::new(config.user.clone(), CanonicalPath::root());
        ctx.cwd = ctx.home();

        let mut session = Self::new(Arc::new(router), ctx, config.mode);
        session.listing = config.list_options();
        session
    }

    pub fn context(&self) -> &PathContext {
        &self.ctx
    }

    pub fn cwd(&self) -> &CanonicalPath {
        &self.ctx.cwd
    }

    pub fn previous_cwd(&self) -> Option<&CanonicalPath> {
        self.prev_cwd.as_ref()
    }

    pub fn mode(&self) -> AddressingMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AddressingMode) {
        tracing::debug!(from = %self.mode, to = %mode, "addressing mode");
        self.mode = mode;
    }

    pub fn router(&self) -> &Arc<VfsRouter> {
        &self.router
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    /// Default listing order for this session.
    pub fn list_options(&self) -> ListOptions {
        self.listing
    }

    /// Resolve a token under the current addressing mode.
    pub async fn resolve(&self, token: &str) -> VfsResult<CanonicalPath> {
        match self.mode {
            AddressingMode::Logical => Ok(paths::resolve(token, &self.ctx)),
            AddressingMode::Physical => self.to_physical(token).await,
        }
    }

    /// Resolve a token and dereference every link along it.
    ///
    /// Fails with [`VfsError::InvalidPath`] when the walk meets a link with
    /// no target.
    pub async fn to_physical(&self, token: &str) -> VfsResult<CanonicalPath> {
        let logical = paths::resolve(token, &self.ctx);
        let walked = links::walk(&self.router, &logical).await;
        if let Some(link) = walked.unresolved.first() {
            let err = VfsError::InvalidPath(format!("{link}: link has no target"));
            self.errors.push(err.clone());
            return Err(err);
        }
        Ok(walked.path)
    }

    /// Change the working directory.
    ///
    /// The target must list successfully; listing it also warms the cache.
    /// Returns the new working directory.
    pub async fn cd(&mut self, token: &str) -> VfsResult<CanonicalPath> {
        let target = self.resolve(token).await?;
        self.router.list(&target, ListOptions::default()).await?;

        let old = std::mem::replace(&mut self.ctx.cwd, target.clone());
        self.prev_cwd = Some(old);
        tracing::debug!(cwd = %target, "changed directory");
        Ok(target)
    }

    /// Return to the previous working directory. `Ok(None)` if there is none.
    pub async fn cd_previous(&mut self) -> VfsResult<Option<CanonicalPath>> {
        match self.prev_cwd.clone() {
            Some(prev) => self.cd(prev.as_str()).await.map(Some),
            None => Ok(None),
        }
    }

    /// The working directory, dereferenced if `physical` is asked for while
    /// the session is logical.
    pub async fn pwd(&self, physical: bool) -> VfsResult<CanonicalPath> {
        if physical && !self.mode.is_physical() {
            self.to_physical(self.ctx.cwd.as_str()).await
        } else {
            Ok(self.ctx.cwd.clone())
        }
    }

    /// List a token's target. A stale cached listing of a directory is
    /// refreshed before it is returned; if the refresh fails the cached
    /// entries are returned as they are.
    pub async fn list(&self, token: &str, opts: ListOptions) -> VfsResult<Vec<Entry>> {
        let path = self.resolve(token).await?;
        let listing = self.router.list_with_freshness(&path, opts).await?;
        if !listing.stale || opts.self_only {
            return Ok(listing.entries);
        }

        tracing::debug!(path = %path, "stale listing, refreshing");
        match self.router.refresh(&path, opts).await {
            Ok(entries) => Ok(entries),
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "refresh failed, serving stale listing");
                self.errors.pop();
                Ok(listing.entries)
            }
        }
    }

    /// Expand wildcard tokens against the working directory.
    pub async fn expand_all<S: AsRef<str>>(&self, tokens: &[S]) -> VfsResult<Vec<String>> {
        self.expander().expand_all(tokens).await
    }

    /// Expand lexed words; quoted words are kept literally.
    pub async fn expand_words(&self, words: &[Word]) -> VfsResult<Vec<String>> {
        self.expander().expand_words(words).await
    }

    fn expander(&self) -> Expander<'_> {
        Expander::new(&self.router, &self.ctx).with_options(self.listing)
    }

    /// Drop cached listings at and below `token`, or everything for `None`.
    pub async fn invalidate(&self, token: Option<&str>) -> VfsResult<()> {
        match token {
            Some(token) => {
                let path = self.resolve(token).await?;
                self.router.invalidate(Some(&path));
            }
            None => self.router.invalidate(None),
        }
        Ok(())
    }

    /// Flag a directory listing as out of date, for mutating commands.
    pub async fn mark_dirty(&self, token: &str) -> VfsResult<()> {
        let path = self.resolve(token).await?;
        self.router.mark_dirty(&path);
        Ok(())
    }
}

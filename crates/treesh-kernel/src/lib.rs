//! treesh-kernel: path resolution and VFS dispatch for the treesh shell.
//!
//! This crate provides:
//!
//! - **Lexer**: Splits command lines into words using logos
//! - **Paths**: Home-shorthand expansion and canonical resolution
//! - **Cache**: Freshness cache consulted before any provider call
//! - **VFS**: Listing providers (overlay catalog, remote tree) and the router
//! - **Links**: Physical-mode link dereferencing
//! - **Expand**: Wildcard expansion against directory listings
//! - **Session**: Working directory, addressing mode, error log
//! - **Builtins**: `cd`, `pwd`, `ls`, `mode`, `invalidate`
//! - **Config**: TOML configuration

pub mod builtins;
pub mod cache;
pub mod config;
pub mod expand;
pub mod lexer;
pub mod links;
pub mod paths;
pub mod session;
pub mod vfs;

pub use builtins::{CommandOutput, run_line};
pub use cache::{CacheEntry, FreshnessCache, ListingCache, TtlPolicy};
pub use config::ShellConfig;
pub use expand::{Expander, has_wildcard};
pub use links::{LinkWalk, resolve_links};
pub use session::Session;
pub use vfs::{
    CatalogProvider, Listing, ListingProvider, MemoryStore, OverlayProvider, ProviderError,
    RemoteTreeProvider, StoreClient, VfsRouter,
};

// Shared data types, so embedders need only this crate
pub use treesh_types::{
    AddressingMode, CanonicalPath, Entry, EntryKind, ErrorLog, ListOptions, PathContext, SortKey,
    VfsError, VfsResult, sort_entries,
};

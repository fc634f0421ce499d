//! Virtual filesystem: listing providers and the router in front of them.
//!
//! Two kinds of provider sit behind one interface:
//!
//! - **Overlay** providers ([`CatalogProvider`]) serve a fixed mount point
//!   and its ancestors from in-process data.
//! - The **remote tree** ([`RemoteTreeProvider`]) serves everything else
//!   through a [`StoreClient`].
//!
//! [`VfsRouter`] picks one per path, consults the freshness cache first and
//! owns sorting and root composition.

mod memory;
mod overlay;
mod remote;
mod router;
mod traits;

pub use memory::MemoryStore;
pub use overlay::CatalogProvider;
pub use remote::RemoteTreeProvider;
pub use router::{Listing, VfsRouter};
pub use traits::{ListingProvider, OverlayProvider, ProviderError, StoreClient};

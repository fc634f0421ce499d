//! Pure data types for treesh: canonical paths, entries, errors.
//!
//! This crate is a leaf dependency with no async runtime and no I/O, so
//! listing providers can be written against it without pulling in the
//! kernel.

pub mod context;
pub mod entry;
pub mod error;
pub mod path;

// Flat re-exports for convenience
pub use context::*;
pub use entry::*;
pub use error::*;
pub use path::*;

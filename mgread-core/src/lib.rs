//! # Core types for mgread
//!
//! Shared pieces of the mgread workspace: the error taxonomy used by every
//! reader, the catalog client that turns a `(user, file)` pair into a path,
//! reader configuration, and small path utilities.
pub mod catalog;
pub mod config;
pub mod consts;
pub mod errors;
pub mod utils;

// re-exports for cleaner imports
pub use catalog::{Catalog, CatalogEntry, FileCatalog, ResolvedFile, resolve_file};
pub use config::ReaderConfig;
pub use errors::{ReaderError, Result};

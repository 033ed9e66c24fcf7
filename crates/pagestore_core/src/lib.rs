#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Configuration options
pub mod config;

/// Page content files and move journal
pub mod content;

/// Parent cycle detection
pub mod cycle;

/// Error (common error types)
pub mod error;

/// Filesystem abstraction
pub mod fs;

/// Unreferenced image cleanup
pub mod images;

/// Link rewriting after pages move
pub mod links;

/// Page records
pub mod page;

/// Path utilities for page path handling
pub mod path_utils;

/// Create, update and rename pages
pub mod rename;

/// Navigation editor batch updates
pub mod reparent;

/// Page list persistence
pub mod repository;

/// The page store facade
pub mod store;

/// Trash (delete, restore, purge)
pub mod trash;

/// Page tree and breadcrumbs
pub mod tree;

pub use error::{PageStoreError, Result};
pub use page::{Page, PageType};
pub use store::PageStore;

#[cfg(test)]
pub mod test_utils;

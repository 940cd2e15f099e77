//! Catalog Core Library
//!
//! Domain types, error taxonomy, and the port traits the catalog service
//! uses to reach its store and cache.

pub mod error;
pub mod ports;
pub mod types;

pub use error::{CatalogError, Result};
pub use ports::{BookStore, CachePort, ReviewStore};
pub use types::*;

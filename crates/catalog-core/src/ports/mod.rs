//! Port traits (interfaces) for dependency injection

pub mod cache;
pub mod storage;

pub use cache::CachePort;
pub use storage::{BookStore, ReviewStore};

//! Storage layer
//!
//! SQLite (embedded) holds books and reviews. The book-listing cache is either
//! an in-process DashMap or Redis.

pub mod db;
pub mod memory;
pub mod redis_cache;

pub use db::Database;
pub use memory::MemoryCache;
pub use redis_cache::RedisCache;

//! HTTP handlers

pub mod books;
pub mod health;
pub mod reviews;

pub use health::health;

//! Storage traits for persistence

use crate::{Book, NewBook, NewReview, Result, Review};
use async_trait::async_trait;

/// Book store
#[async_trait]
pub trait BookStore: Send + Sync {
    /// All books in the store's natural order.
    async fn list_books(&self) -> Result<Vec<Book>>;
    async fn find_book(&self, title: &str, author: &str) -> Result<Option<Book>>;
    /// Insert atomically. A (title, author) collision must surface as
    /// `DuplicateEntity` and leave no row behind.
    async fn insert_book(&self, book: &NewBook) -> Result<Book>;
}

/// Review store
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn list_reviews(&self, book_id: i64) -> Result<Vec<Review>>;
    async fn insert_review(&self, book_id: i64, review: &NewReview) -> Result<Review>;
}

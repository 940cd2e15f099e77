//! Catalog service: books and reviews over a store with a read-through cache
//!
//! The book listing is cached under a single key and deleted after every
//! successful book insert. Reviews are never cached.

use catalog_core::{
    Book, BookStore, CachePort, CatalogError, NewBook, NewReview, Result, Review, ReviewStore,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Cache key holding the JSON-encoded book listing.
pub const BOOKS_CACHE_KEY: &str = "books_cache";

pub const DEFAULT_BOOKS_CACHE_TTL: Duration = Duration::from_secs(300);

pub struct CatalogService {
    books: Arc<dyn BookStore>,
    reviews: Arc<dyn ReviewStore>,
    cache: Arc<dyn CachePort>,
    books_ttl: Duration,
    /// Bumped after each committed book write, before the key is deleted.
    /// Readers compare it around their store query to detect an overlapping
    /// write and drop the snapshot they just cached.
    listing_epoch: AtomicU64,
}

impl CatalogService {
    pub fn new(
        books: Arc<dyn BookStore>,
        reviews: Arc<dyn ReviewStore>,
        cache: Arc<dyn CachePort>,
        books_ttl: Duration,
    ) -> Self {
        Self {
            books,
            reviews,
            cache,
            books_ttl,
            listing_epoch: AtomicU64::new(0),
        }
    }

    pub async fn list_books(&self) -> Result<Vec<Book>> {
        match self.cache.get(BOOKS_CACHE_KEY).await {
            Ok(Some(data)) => match serde_json::from_slice::<Vec<Book>>(&data) {
                Ok(books) => {
                    debug!("Book listing served from cache ({} books)", books.len());
                    return Ok(books);
                }
                Err(e) => warn!("Discarding unreadable book listing cache entry: {}", e),
            },
            Ok(None) => debug!("Book listing cache miss"),
            Err(e) => warn!("Cache read failed, falling back to store: {}", e),
        }

        let epoch = self.listing_epoch.load(Ordering::SeqCst);

        let books = self.books.list_books().await.map_err(|e| {
            error!("Failed to retrieve books: {}", e);
            e
        })?;

        let snapshot = serde_json::to_vec(&books)?;
        if let Err(e) = self
            .cache
            .set_with_ttl(BOOKS_CACHE_KEY, snapshot, self.books_ttl)
            .await
        {
            warn!("Failed to populate book listing cache: {}", e);
            return Ok(books);
        }

        if self.listing_epoch.load(Ordering::SeqCst) != epoch {
            debug!("Book written during listing, dropping the snapshot just cached");
            self.invalidate_books().await;
        }

        Ok(books)
    }

    pub async fn add_book(&self, book: NewBook) -> Result<Book> {
        book.validate()?;

        debug!("Checking for existing book: {} by {}", book.title, book.author);
        if self.books.find_book(&book.title, &book.author).await?.is_some() {
            debug!("Duplicate book found");
            return Err(CatalogError::duplicate(&book.title, &book.author));
        }

        // The store's unique constraint rejects a racing duplicate here
        let created = match self.books.insert_book(&book).await {
            Ok(created) => created,
            Err(e @ CatalogError::DuplicateEntity { .. }) => {
                debug!("Duplicate book rejected by store constraint");
                return Err(e);
            }
            Err(e) => {
                error!("Failed to insert book: {}", e);
                return Err(e);
            }
        };

        self.listing_epoch.fetch_add(1, Ordering::SeqCst);
        self.invalidate_books().await;

        info!(
            "Created book {}: {} by {}",
            created.id, created.title, created.author
        );
        Ok(created)
    }

    pub async fn list_reviews(&self, book_id: i64) -> Result<Vec<Review>> {
        self.reviews.list_reviews(book_id).await
    }

    pub async fn add_review(&self, book_id: i64, review: NewReview) -> Result<Review> {
        let created = self.reviews.insert_review(book_id, &review).await?;
        info!(
            "Created review {} for book {} (rating {})",
            created.id, book_id, created.rating
        );
        Ok(created)
    }

    async fn invalidate_books(&self) {
        if let Err(e) = self.cache.delete(BOOKS_CACHE_KEY).await {
            error!("Failed to invalidate book listing cache: {}", e);
        }
    }
}

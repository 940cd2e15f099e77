//! SQLite database layer (embedded, no external dependencies)

use anyhow::{Context, Result};
use async_trait::async_trait;
use catalog_core::{Book, BookStore, CatalogError, NewBook, NewReview, Review, ReviewStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct Database {
    pool: Arc<SqlitePool>,
}

impl Database {
    pub async fn new(database_path: &str, max_connections: u32) -> Result<Self> {
        tracing::info!("Opening SQLite database at: {}", database_path);

        let parent = std::path::Path::new(database_path)
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Invalid database path: no parent directory"))?;

        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        // Reviews may point at books that do not exist.
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(false)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .with_context(|| {
                format!("Failed to connect to SQLite database at: {}", database_path)
            })?;

        tracing::info!("SQLite connection established, running migrations...");

        Self::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        tracing::info!("Database initialization complete");

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    #[cfg(test)]
    /// Private in-memory database. A single connection that is never recycled,
    /// otherwise the data would vanish with it.
    pub async fn in_memory() -> Result<Self> {
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory SQLite database")?;

        Self::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        // Books table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                CONSTRAINT unique_title_author UNIQUE (title, author)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS ix_books_title ON books (title)")
            .execute(pool)
            .await?;

        // Reviews table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                book_id INTEGER NOT NULL REFERENCES books (id),
                content TEXT NOT NULL,
                rating INTEGER NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS ix_reviews_book_id ON reviews (book_id)")
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Drop every row and recreate the schema. Administrative/test-only.
    pub async fn reset(&self) -> catalog_core::Result<()> {
        tracing::warn!("Resetting catalog store");

        sqlx::query("DROP TABLE IF EXISTS reviews")
            .execute(&*self.pool)
            .await
            .map_err(store_error)?;
        sqlx::query("DROP TABLE IF EXISTS books")
            .execute(&*self.pool)
            .await
            .map_err(store_error)?;

        Self::run_migrations(&self.pool)
            .await
            .map_err(|e| CatalogError::Store(format!("{:#}", e)))
    }

    #[cfg(test)]
    pub async fn count_books(&self, title: &str, author: &str) -> catalog_core::Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM books WHERE title = ?1 AND author = ?2")
                .bind(title)
                .bind(author)
                .fetch_one(&*self.pool)
                .await
                .map_err(store_error)?;

        Ok(count)
    }
}

#[async_trait]
impl BookStore for Database {
    async fn list_books(&self) -> catalog_core::Result<Vec<Book>> {
        let rows: Vec<BookRow> = sqlx::query_as(
            r#"
            SELECT id, title, author FROM books ORDER BY id
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(store_error)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn find_book(&self, title: &str, author: &str) -> catalog_core::Result<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as(
            r#"
            SELECT id, title, author FROM books WHERE title = ?1 AND author = ?2
            "#,
        )
        .bind(title)
        .bind(author)
        .fetch_optional(&*self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.map(|r| r.into()))
    }

    async fn insert_book(&self, book: &NewBook) -> catalog_core::Result<Book> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO books (title, author) VALUES (?1, ?2)
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .execute(&mut *tx)
        .await;

        let id = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!("Rollback after failed book insert failed: {}", rollback_err);
                }
                return Err(match e {
                    sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                        CatalogError::duplicate(&book.title, &book.author)
                    }
                    other => store_error(other),
                });
            }
        };

        tx.commit().await.map_err(store_error)?;

        Ok(Book {
            id,
            title: book.title.clone(),
            author: book.author.clone(),
        })
    }
}

#[async_trait]
impl ReviewStore for Database {
    async fn list_reviews(&self, book_id: i64) -> catalog_core::Result<Vec<Review>> {
        let rows: Vec<ReviewRow> = sqlx::query_as(
            r#"
            SELECT id, book_id, content, rating FROM reviews
            WHERE book_id = ?1
            ORDER BY id
            "#,
        )
        .bind(book_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(store_error)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn insert_review(&self, book_id: i64, review: &NewReview) -> catalog_core::Result<Review> {
        let result = sqlx::query(
            r#"
            INSERT INTO reviews (book_id, content, rating) VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(book_id)
        .bind(&review.content)
        .bind(review.rating)
        .execute(&*self.pool)
        .await
        .map_err(store_error)?;

        Ok(Review {
            id: result.last_insert_rowid(),
            book_id,
            content: review.content.clone(),
            rating: review.rating,
        })
    }
}

/// Map a sqlx failure onto the catalog taxonomy.
fn store_error(e: sqlx::Error) -> CatalogError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            CatalogError::Store(format!("constraint violation: {}", db_err))
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            CatalogError::StoreUnavailable(e.to_string())
        }
        other => CatalogError::Store(other.to_string()),
    }
}

// Helper structs for sqlx query_as
#[derive(sqlx::FromRow)]
struct BookRow {
    id: i64,
    title: String,
    author: String,
}

impl From<BookRow> for Book {
    fn from(r: BookRow) -> Self {
        Book {
            id: r.id,
            title: r.title,
            author: r.author,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    book_id: i64,
    content: String,
    rating: i64,
}

impl From<ReviewRow> for Review {
    fn from(r: ReviewRow) -> Self {
        Review {
            id: r.id,
            book_id: r.book_id,
            content: r.content,
            rating: r.rating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    async fn test_db() -> Database {
        Database::in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_list_books() {
        let db = test_db().await;

        let first = assert_ok!(db.insert_book(&NewBook::new("Animal Farm", "George Orwell")).await);
        let second = assert_ok!(db.insert_book(&NewBook::new("The Hobbit", "J.R.R. Tolkien")).await);
        assert!(second.id > first.id);

        let books = db.list_books().await.unwrap();
        assert_eq!(books, vec![first, second]);
    }

    #[tokio::test]
    async fn test_unique_constraint_is_backstop() {
        let db = test_db().await;
        let book = NewBook::new("Animal Farm", "George Orwell");

        db.insert_book(&book).await.unwrap();
        let err = db.insert_book(&book).await.unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateEntity { .. }));
        assert_eq!(db.count_books("Animal Farm", "George Orwell").await.unwrap(), 1);

        // Same author, different title is fine
        assert_ok!(db.insert_book(&NewBook::new("1984", "George Orwell")).await);
    }

    #[tokio::test]
    async fn test_find_book_exact_match() {
        let db = test_db().await;
        db.insert_book(&NewBook::new("Jane Eyre", "Charlotte Brontë"))
            .await
            .unwrap();

        assert!(db.find_book("Jane Eyre", "Charlotte Brontë").await.unwrap().is_some());
        assert!(db.find_book("jane eyre", "Charlotte Brontë").await.unwrap().is_none());
        assert!(db.find_book("Jane Eyre", "Emily Brontë").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_failed_insert() {
        let db = test_db().await;
        let a = db.insert_book(&NewBook::new("A", "X")).await.unwrap();
        let _ = db.insert_book(&NewBook::new("A", "X")).await;
        let b = db.insert_book(&NewBook::new("B", "X")).await.unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn test_reviews_scoped_by_book() {
        let db = test_db().await;

        // No referential check: book 5 does not exist
        let review = db
            .insert_review(
                5,
                &NewReview {
                    content: "great".to_string(),
                    rating: 4,
                },
            )
            .await
            .unwrap();
        assert_eq!(review.book_id, 5);

        db.insert_review(
            6,
            &NewReview {
                content: "meh".to_string(),
                rating: 2,
            },
        )
        .await
        .unwrap();

        let reviews = db.list_reviews(5).await.unwrap();
        assert_eq!(reviews, vec![review]);
        assert!(db.list_reviews(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let db = test_db().await;
        db.insert_book(&NewBook::new("A", "X")).await.unwrap();
        db.insert_review(
            1,
            &NewReview {
                content: "ok".to_string(),
                rating: 3,
            },
        )
        .await
        .unwrap();

        db.reset().await.unwrap();

        assert!(db.list_books().await.unwrap().is_empty());
        assert!(db.list_reviews(1).await.unwrap().is_empty());
        assert_ok!(db.insert_book(&NewBook::new("A", "X")).await);
    }
}

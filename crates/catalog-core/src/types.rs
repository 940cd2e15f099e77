//! Catalog domain types

use crate::{CatalogError, Result};
use serde::{Deserialize, Serialize};

/// A stored book. Identity is assigned by the store and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
}

/// Payload for creating a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewBook {
    pub title: String,
    pub author: String,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
        }
    }

    /// Both fields must carry non-blank text.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(CatalogError::validation("title must not be empty"));
        }
        if self.author.trim().is_empty() {
            return Err(CatalogError::validation("author must not be empty"));
        }
        Ok(())
    }
}

/// A stored review. `book_id` is not checked against existing books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub book_id: i64,
    pub content: String,
    pub rating: i64,
}

/// Payload for creating a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewReview {
    pub content: String,
    pub rating: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_book_validation() {
        assert!(NewBook::new("Jane Eyre", "Charlotte Brontë").validate().is_ok());
        assert!(matches!(
            NewBook::new("", "Someone").validate(),
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            NewBook::new("Something", "   ").validate(),
            Err(CatalogError::Validation(_))
        ));
    }

    #[test]
    fn test_new_book_rejects_missing_and_unknown_fields() {
        assert!(serde_json::from_str::<NewBook>(r#"{"title": "Missing Author"}"#).is_err());
        assert!(serde_json::from_str::<NewBook>(r#"{"title": 123, "author": "Test"}"#).is_err());
        assert!(serde_json::from_str::<NewBook>(
            r#"{"title": "A", "author": "B", "year": 1999}"#
        )
        .is_err());
    }

    #[test]
    fn test_new_review_shape() {
        let review: NewReview =
            serde_json::from_str(r#"{"content": "great", "rating": 4}"#).unwrap();
        assert_eq!(review.content, "great");
        assert_eq!(review.rating, 4);

        assert!(serde_json::from_str::<NewReview>(r#"{"content": "great"}"#).is_err());
        assert!(serde_json::from_str::<NewReview>(
            r#"{"content": "great", "rating": 4, "book_id": 9}"#
        )
        .is_err());
    }
}

//! Error types for the catalog

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// A book with the same (title, author) pair is already stored.
    #[error("Book already exists")]
    DuplicateEntity { title: String, author: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CatalogError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CatalogError::Validation(msg.into())
    }

    pub fn duplicate(title: &str, author: &str) -> Self {
        CatalogError::DuplicateEntity {
            title: title.to_string(),
            author: author.to_string(),
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_message_hides_fields() {
        let err = CatalogError::duplicate("Animal Farm", "George Orwell");
        assert_eq!(err.to_string(), "Book already exists");
        match err {
            CatalogError::DuplicateEntity { title, author } => {
                assert_eq!(title, "Animal Farm");
                assert_eq!(author, "George Orwell");
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_serde_error_conversion() {
        let err: CatalogError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, CatalogError::Serialization(_)));
    }
}

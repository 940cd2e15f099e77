//! API error responses

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use catalog_core::CatalogError;
use serde_json::json;

/// Error returned by handlers; renders as `{"code": ..., "detail": ...}`.
#[derive(Debug)]
pub struct ApiError(pub CatalogError);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            CatalogError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CatalogError::DuplicateEntity { .. } => StatusCode::BAD_REQUEST,
            CatalogError::StoreUnavailable(_) | CatalogError::CacheUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CatalogError::Store(_) | CatalogError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match &self.0 {
            CatalogError::Validation(_) => "validation_error",
            CatalogError::DuplicateEntity { .. } => "duplicate_entity",
            CatalogError::StoreUnavailable(_) => "store_unavailable",
            CatalogError::CacheUnavailable(_) => "cache_unavailable",
            CatalogError::Store(_) => "store_error",
            CatalogError::Serialization(_) => "serialization_error",
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        ApiError(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(CatalogError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(CatalogError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        let body = Json(json!({
            "code": self.code(),
            "detail": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

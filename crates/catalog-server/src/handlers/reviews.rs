//! Review handlers

use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    Json,
};
use catalog_core::{NewReview, Review};
use serde::Serialize;

/// Reviews are rendered without their book reference.
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    id: i64,
    content: String,
    rating: i64,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            content: r.content,
            rating: r.rating,
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    book_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let Path(book_id) = book_id?;
    let reviews = state.catalog.list_reviews(book_id).await?;
    Ok(Json(reviews.into_iter().map(ReviewResponse::from).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    book_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<NewReview>, JsonRejection>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let Path(book_id) = book_id?;
    let Json(new_review) = payload?;
    let review = state.catalog.add_review(book_id, new_review).await?;
    Ok(Json(review.into()))
}

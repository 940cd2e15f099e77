//! Book handlers

use crate::error::ApiError;
use crate::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use catalog_core::{Book, NewBook};

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Book>>, ApiError> {
    let books = state.catalog.list_books().await?;
    Ok(Json(books))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewBook>, JsonRejection>,
) -> Result<Json<Book>, ApiError> {
    let Json(new_book) = payload?;
    let book = state.catalog.add_book(new_book).await?;
    Ok(Json(book))
}

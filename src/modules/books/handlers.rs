//! HTTP handlers for `/books`

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use shelf_http::{AppError, JsonBody, PathId};

use super::models::{Book, CreateBookRequest, UpdateBookRequest, ValidationError};
use super::repository::{BookRepository, RepositoryError};

/// Repository handle shared by every books handler
pub type BooksState = Arc<dyn BookRepository>;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedResponse {
    pub id: i32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::internal(err)
    }
}

/// POST /books
pub async fn create_book(
    State(repo): State<BooksState>,
    JsonBody(request): JsonBody<CreateBookRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    request.validate()?;

    let id = repo.create(&request).await?;
    tracing::info!(book_id = id, "book created");

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// GET /books
pub async fn list_books(State(repo): State<BooksState>) -> Result<Json<Vec<Book>>, AppError> {
    let books = repo.list().await?;
    Ok(Json(books))
}

/// GET /books/{id}
pub async fn get_book(
    State(repo): State<BooksState>,
    PathId(id): PathId,
) -> Result<Json<Book>, AppError> {
    repo.get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Book not found"))
}

/// PUT /books/{id}
pub async fn update_book(
    State(repo): State<BooksState>,
    PathId(id): PathId,
    JsonBody(request): JsonBody<UpdateBookRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    request.validate()?;

    repo.update(id, &request).await?;
    tracing::info!(book_id = id, "book updated");

    Ok(Json(MessageResponse {
        message: "Book updated successfully".to_string(),
    }))
}

/// DELETE /books/{id}
pub async fn delete_book(
    State(repo): State<BooksState>,
    PathId(id): PathId,
) -> Result<StatusCode, AppError> {
    repo.delete(id).await?;
    tracing::info!(book_id = id, "book deleted");

    Ok(StatusCode::NO_CONTENT)
}

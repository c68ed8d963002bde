//! Storage for books.
//!
//! [`PgBookRepository`] is the production implementation; each operation is a
//! single parameterized statement against the pre-existing `books` table.
//! [`InMemoryBookRepository`] keeps rows in process and backs the HTTP tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;

use super::models::{Book, CreateBookRequest, UpdateBookRequest};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait BookRepository: Send + Sync + 'static {
    /// Insert one row and return the identifier storage assigned to it
    async fn create(&self, request: &CreateBookRequest) -> Result<i32, RepositoryError>;

    /// `Ok(None)` when no row has this id
    async fn get_by_id(&self, id: i32) -> Result<Option<Book>, RepositoryError>;

    /// Every row, ordered by id
    async fn list(&self) -> Result<Vec<Book>, RepositoryError>;

    /// Overwrite title, author and year of the row. A missing row is not an error.
    async fn update(&self, id: i32, request: &UpdateBookRequest) -> Result<(), RepositoryError>;

    /// Remove the row. A missing row is not an error.
    async fn delete(&self, id: i32) -> Result<(), RepositoryError>;
}

/// Book repository over a PostgreSQL pool
#[derive(Clone)]
pub struct PgBookRepository {
    pool: PgPool,
}

impl PgBookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn create(&self, request: &CreateBookRequest) -> Result<i32, RepositoryError> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO books (title, author, year) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&request.title)
        .bind(&request.author)
        .bind(request.year)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<Book>, RepositoryError> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, year FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    async fn list(&self) -> Result<Vec<Book>, RepositoryError> {
        let books =
            sqlx::query_as::<_, Book>("SELECT id, title, author, year FROM books ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(books)
    }

    async fn update(&self, id: i32, request: &UpdateBookRequest) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE books SET title = $1, author = $2, year = $3 WHERE id = $4")
            .bind(&request.title)
            .bind(&request.author)
            .bind(request.year)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Process-local repository with the same observable behaviour as the
/// Postgres one: ids start at 1 and are never reused.
#[derive(Default)]
pub struct InMemoryBookRepository {
    state: RwLock<InMemoryState>,
}

#[derive(Default)]
struct InMemoryState {
    last_id: i32,
    books: BTreeMap<i32, Book>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn create(&self, request: &CreateBookRequest) -> Result<i32, RepositoryError> {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let id = state.last_id;

        state.books.insert(
            id,
            Book {
                id,
                title: request.title.clone(),
                author: request.author.clone(),
                year: request.year,
            },
        );

        Ok(id)
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<Book>, RepositoryError> {
        Ok(self.state.read().await.books.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Book>, RepositoryError> {
        Ok(self.state.read().await.books.values().cloned().collect())
    }

    async fn update(&self, id: i32, request: &UpdateBookRequest) -> Result<(), RepositoryError> {
        if let Some(book) = self.state.write().await.books.get_mut(&id) {
            book.title = request.title.clone();
            book.author = request.author.clone();
            book.year = request.year;
        }

        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        self.state.write().await.books.remove(&id);
        Ok(())
    }
}

pub mod handlers;
pub mod models;
pub mod repository;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::get, Router};
use shelf_kernel::{InitCtx, Module};

use handlers::BooksState;
use repository::BookRepository;

/// Books module: CRUD over the `books` table, mounted at `/books`
pub struct BooksModule {
    repo: BooksState,
}

impl BooksModule {
    pub fn new(repo: Arc<dyn BookRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route(
                "/",
                get(handlers::list_books).post(handlers::create_book),
            )
            .route(
                "/{id}",
                get(handlers::get_book)
                    .put(handlers::update_book)
                    .delete(handlers::delete_book),
            )
            .with_state(self.repo.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "content": {
            "application/json": { "schema": schema }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let id_param = serde_json::json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int32" }
    }]);
    let book_ref = serde_json::json!({ "$ref": "#/components/schemas/Book" });
    let book_input = serde_json::json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/BookInput" }
            }
        }
    });

    serde_json::json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": json_response("Every book", serde_json::json!({
                            "type": "array",
                            "items": book_ref
                        })),
                        "500": error_response("Internal server error")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": book_input,
                    "responses": {
                        "201": json_response("Identifier of the new book", serde_json::json!({
                            "type": "object",
                            "properties": { "id": { "type": "integer", "format": "int32" } },
                            "required": ["id"]
                        })),
                        "400": error_response("Malformed JSON or failed validation"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": id_param,
                    "responses": {
                        "200": json_response("The book", book_ref.clone()),
                        "400": error_response("ID must be a number"),
                        "404": error_response("Book not found"),
                        "500": error_response("Internal server error")
                    }
                },
                "put": {
                    "summary": "Replace a book",
                    "tags": ["Books"],
                    "parameters": id_param,
                    "requestBody": book_input,
                    "responses": {
                        "200": json_response("Confirmation", serde_json::json!({
                            "type": "object",
                            "properties": { "message": { "type": "string" } },
                            "required": ["message"]
                        })),
                        "400": error_response("Bad id, malformed JSON or failed validation"),
                        "500": error_response("Internal server error")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": id_param,
                    "responses": {
                        "204": { "description": "Deleted" },
                        "400": error_response("ID must be a number"),
                        "500": error_response("Internal server error")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int32" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "year": { "type": "integer", "format": "int32" }
                    },
                    "required": ["id", "title", "author", "year"]
                },
                "BookInput": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "description": "Must not be blank" },
                        "author": { "type": "string", "description": "Must not be blank" },
                        "year": {
                            "type": "integer",
                            "format": "int32",
                            "minimum": models::MIN_YEAR,
                            "maximum": models::MAX_YEAR
                        }
                    },
                    "required": ["title", "author", "year"]
                }
            }
        }
    })
}

/// Create a books module backed by `repo`
pub fn create_module(repo: Arc<dyn BookRepository>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(repo))
}

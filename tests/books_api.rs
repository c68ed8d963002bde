use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use shelf_app::modules::{
    self,
    books::{
        models::{Book, CreateBookRequest, UpdateBookRequest},
        repository::{BookRepository, InMemoryBookRepository, RepositoryError},
    },
};
use shelf_kernel::{settings::Settings, ModuleRegistry};

fn app_with(repo: Arc<dyn BookRepository>) -> Router {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, repo);
    shelf_http::build_router(Arc::new(registry), &Settings::default())
}

fn app() -> Router {
    app_with(Arc::new(InMemoryBookRepository::new()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

async fn create(app: &Router, title: &str, author: &str, year: i32) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/books",
        Some(json!({ "title": title, "author": author, "year": year })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_reports_connected() {
    let (status, body) = send(&app(), "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "OK", "database": "connected" }));
}

#[tokio::test]
async fn empty_list_is_an_array() {
    let (status, body) = send(&app(), "GET", "/books", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn created_book_can_be_fetched() {
    let app = app();
    let id = create(&app, "Kindred", "Octavia E. Butler", 1979).await;

    let (status, body) = send(&app, "GET", &format!("/books/{id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "id": id, "title": "Kindred", "author": "Octavia E. Butler", "year": 1979 })
    );
}

#[tokio::test]
async fn list_returns_books_in_creation_order() {
    let app = app();
    let first = create(&app, "Parable of the Sower", "Octavia E. Butler", 1993).await;
    let second = create(&app, "Parable of the Talents", "Octavia E. Butler", 1998).await;

    let (status, body) = send(&app, "GET", "/books", None).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![first, second]);
}

#[tokio::test]
async fn missing_book_is_not_found() {
    let (status, body) = send(&app(), "GET", "/books/999999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Book not found" }));
}

#[tokio::test]
async fn blank_title_is_rejected() {
    let (status, body) = send(
        &app(),
        "POST",
        "/books",
        Some(json!({ "title": "", "author": "X", "year": 2000 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "title is required" }));
}

#[tokio::test]
async fn out_of_range_year_is_rejected() {
    let (status, body) = send(
        &app(),
        "POST",
        "/books",
        Some(json!({ "title": "X", "author": "Y", "year": 3000 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "year must be between 0 and 2026" }));
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/books")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"title": "Dawn", "author": "#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "error": "Invalid JSON body" }));
}

#[tokio::test]
async fn wrongly_typed_field_is_rejected() {
    let (status, body) = send(
        &app(),
        "POST",
        "/books",
        Some(json!({ "title": "Dawn", "author": "Octavia E. Butler", "year": "1987" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON body");
}

#[tokio::test]
async fn update_is_reflected_by_get() {
    let app = app();
    let id = create(&app, "Wild Seed", "Octavia Butler", 1980).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/books/{id}"),
        Some(json!({ "title": "Wild Seed", "author": "Octavia E. Butler", "year": 1980 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Book updated successfully" }));

    let (_, body) = send(&app, "GET", &format!("/books/{id}"), None).await;
    assert_eq!(body["author"], "Octavia E. Butler");
    assert_eq!(body["title"], "Wild Seed");
    assert_eq!(body["year"], 1980);
}

#[tokio::test]
async fn update_with_blank_author_is_rejected() {
    let app = app();
    let id = create(&app, "Fledgling", "Octavia E. Butler", 2005).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/books/{id}"),
        Some(json!({ "title": "Fledgling", "author": "  ", "year": 2005 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "author is required" }));
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = app();
    let id = create(&app, "Mind of My Mind", "Octavia E. Butler", 1977).await;

    let (status, body) = send(&app, "DELETE", &format!("/books/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, "GET", &format!("/books/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Book not found" }));
}

#[tokio::test]
async fn update_and_delete_of_missing_book_still_succeed() {
    let app = app();

    let (status, _) = send(
        &app,
        "PUT",
        "/books/424242",
        Some(json!({ "title": "Ghost", "author": "Nobody", "year": 2001 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "DELETE", "/books/424242", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn non_numeric_id_is_rejected_everywhere() {
    let app = app();
    let valid = json!({ "title": "T", "author": "A", "year": 2000 });

    for (method, body) in [("GET", None), ("PUT", Some(valid)), ("DELETE", None)] {
        let (status, response) = send(&app, method, "/books/abc", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} /books/abc");
        assert_eq!(response, json!({ "error": "ID must be a number" }));
    }
}

#[tokio::test]
async fn unknown_route_uses_error_envelope() {
    let (status, body) = send(&app(), "GET", "/authors", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Route not found" }));
}

#[tokio::test]
async fn unsupported_method_uses_error_envelope() {
    let (status, body) = send(&app(), "PATCH", "/books/1", None).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "error": "Method not allowed" }));
}

#[tokio::test]
async fn openapi_document_lists_book_routes() {
    let (status, body) = send(&app(), "GET", "/docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/books"]["post"].is_object());
    assert!(body["paths"]["/books/{id}"]["delete"].is_object());
}

struct UnavailableRepository;

#[async_trait]
impl BookRepository for UnavailableRepository {
    async fn create(&self, _request: &CreateBookRequest) -> Result<i32, RepositoryError> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn get_by_id(&self, _id: i32) -> Result<Option<Book>, RepositoryError> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn list(&self) -> Result<Vec<Book>, RepositoryError> {
        Err(sqlx::Error::PoolClosed.into())
    }

    async fn update(&self, _id: i32, _request: &UpdateBookRequest) -> Result<(), RepositoryError> {
        Err(sqlx::Error::PoolClosed.into())
    }

    async fn delete(&self, _id: i32) -> Result<(), RepositoryError> {
        Err(sqlx::Error::PoolClosed.into())
    }
}

#[tokio::test]
async fn storage_failures_are_generic_500s() {
    let app = app_with(Arc::new(UnavailableRepository));
    let payload = json!({ "title": "T", "author": "A", "year": 2000 });

    for (method, uri, body) in [
        ("GET", "/books", None),
        ("POST", "/books", Some(payload.clone())),
        ("GET", "/books/1", None),
        ("PUT", "/books/1", Some(payload)),
        ("DELETE", "/books/1", None),
    ] {
        let (status, response) = send(&app, method, uri, body).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
        assert_eq!(response, json!({ "error": "Internal server error" }));
    }
}

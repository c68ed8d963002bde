//! `GET /health`

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, routing::MethodRouter, Json};
use serde::{Deserialize, Serialize};

use shelf_kernel::ModuleRegistry;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

impl HealthResponse {
    fn healthy() -> Self {
        Self {
            status: "OK".to_string(),
            database: "connected".to_string(),
        }
    }

    fn unhealthy() -> Self {
        Self {
            status: "UNAVAILABLE".to_string(),
            database: "disconnected".to_string(),
        }
    }
}

/// Method router for the health endpoint, bound to the module registry
pub fn route(registry: Arc<ModuleRegistry>) -> MethodRouter {
    get(health_check).with_state(registry)
}

async fn health_check(
    State(registry): State<Arc<ModuleRegistry>>,
) -> (StatusCode, Json<HealthResponse>) {
    let failing = registry.unhealthy_modules().await;

    if failing.is_empty() {
        (StatusCode::OK, Json(HealthResponse::healthy()))
    } else {
        tracing::warn!(modules = ?failing, "health check failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse::unhealthy()),
        )
    }
}

//! Process wiring: database handle, module registry, HTTP server.

use std::sync::Arc;

use anyhow::Context;
use shelf_db::{Database, DatabaseModule};
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules::{self, books::repository::PgBookRepository};

/// Register the database module and every application module against `database`.
pub fn build_registry(database: &Database) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();

    registry.register_core(Arc::new(DatabaseModule::new(database.clone())));
    modules::register_all(
        &mut registry,
        Arc::new(PgBookRepository::new(database.pool().clone())),
    );

    registry
}

/// Probe the database, serve HTTP until a shutdown signal, then stop every module.
///
/// An unreachable database aborts startup before the listener is bound.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        db_host = %settings.database.host,
        db_name = %settings.database.name,
        "shelf-app bootstrap starting"
    );

    let database = Database::connect_lazy(&settings.database);
    let registry = Arc::new(build_registry(&database));
    let ctx = InitCtx {
        settings: &settings,
    };

    registry
        .init_all(&ctx)
        .await
        .context("module initialization failed")?;
    registry
        .start_all(&ctx)
        .await
        .context("module startup failed")?;

    tracing::info!("shelf-app bootstrap complete");

    let served = shelf_http::start_server(registry.clone(), &settings).await;
    let stopped = registry.stop_all().await;

    served?;
    stopped
}

/// Run only the startup readiness probe.
pub async fn check_database(settings: &Settings) -> anyhow::Result<()> {
    let database = Database::connect_lazy(&settings.database);
    let probe = database.wait_ready().await;
    database.close().await;

    probe.with_context(|| {
        format!(
            "database {} is not responding",
            shelf_db::redacted_url(&settings.database)
        )
    })
}

//! PostgreSQL access for the shelf service.
//!
//! [`Database`] owns the process-wide `PgPool`. It is created once at startup,
//! handed to whoever needs it, and closed when [`DatabaseModule`] stops.

use std::time::Duration;

use async_trait::async_trait;
use shelf_kernel::{settings::DatabaseSettings, InitCtx, Module};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("database did not respond within {0:?}")]
    Timeout(Duration),
}

/// Shared handle over the connection pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    connect_timeout: Duration,
}

impl Database {
    /// Build a pool without opening any connection yet.
    ///
    /// Call [`Database::wait_ready`] to verify the server is reachable.
    pub fn connect_lazy(settings: &DatabaseSettings) -> Self {
        let pool = PgPoolOptions::new().connect_lazy_with(connect_options(settings));

        tracing::info!(
            target: "shelf-db",
            url = %redacted_url(settings),
            "database pool configured"
        );

        Self {
            pool,
            connect_timeout: settings.connect_timeout(),
        }
    }

    /// Wrap an existing pool, e.g. one created by a test harness.
    pub fn from_pool(pool: PgPool, connect_timeout: Duration) -> Self {
        Self {
            pool,
            connect_timeout,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip a trivial statement through the pool.
    pub async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Readiness probe bounded by the configured connect timeout.
    pub async fn wait_ready(&self) -> Result<(), DbError> {
        tokio::time::timeout(self.connect_timeout, self.ping())
            .await
            .map_err(|_| DbError::Timeout(self.connect_timeout))?
    }

    /// Close every pooled connection; later queries fail immediately.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Connection options assembled from the individual settings fields.
pub fn connect_options(settings: &DatabaseSettings) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .password(&settings.password)
        .database(&settings.name)
        .ssl_mode(PgSslMode::Disable)
}

/// Connection string with the password left out, suitable for logs.
pub fn redacted_url(settings: &DatabaseSettings) -> String {
    format!(
        "postgres://{}@{}:{}/{}?sslmode=disable",
        settings.user, settings.host, settings.port, settings.name
    )
}

/// Core module owning the database lifecycle.
pub struct DatabaseModule {
    database: Database,
}

impl DatabaseModule {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl Module for DatabaseModule {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.database.wait_ready().await.map_err(|err| {
            tracing::error!(
                target: "shelf-db",
                url = %redacted_url(&ctx.settings.database),
                error = %err,
                "database is not responding"
            );
            anyhow::Error::new(err)
        })?;

        tracing::info!(target: "shelf-db", "database connection verified");
        Ok(())
    }

    async fn check_health(&self) -> anyhow::Result<()> {
        self.database.ping().await?;
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.database.close().await;
        tracing::info!(target: "shelf-db", "database pool closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> DatabaseSettings {
        DatabaseSettings {
            host: "db.internal".to_string(),
            port: 6543,
            user: "librarian".to_string(),
            password: "s3cret".to_string(),
            name: "catalogue".to_string(),
            connect_timeout_secs: 1,
        }
    }

    #[test]
    fn connect_options_carry_every_field() {
        let options = connect_options(&settings());

        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "librarian");
        assert_eq!(options.get_database(), Some("catalogue"));
    }

    #[test]
    fn redacted_url_omits_password() {
        let url = redacted_url(&settings());

        assert_eq!(
            url,
            "postgres://librarian@db.internal:6543/catalogue?sslmode=disable"
        );
        assert!(!url.contains("s3cret"));
    }

    #[tokio::test]
    async fn readiness_probe_fails_when_nothing_listens() {
        let mut settings = settings();
        settings.host = "127.0.0.1".to_string();
        settings.port = 1;

        let database = Database::connect_lazy(&settings);

        assert!(database.wait_ready().await.is_err());
    }

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p shelf-db -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn ping_succeeds_against_live_database() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = PgPool::connect(&url).await.expect("pool creation failed");
        let database = Database::from_pool(pool, Duration::from_secs(5));

        database.wait_ready().await.expect("database should be ready");
        database.close().await;
        assert!(database.ping().await.is_err());
    }
}

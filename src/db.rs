//! Database connection pool and migration management.
//!
//! This module provides utilities for:
//! - Choosing the backing engine (SQLite or PostgreSQL) from the database URL
//! - Creating and managing the connection pool
//! - Running the engine's schema migrations

use std::str::FromStr;

use sqlx::{
    PgPool, SqlitePool,
    postgres::PgPoolOptions,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use url::Url;

use crate::{
    config::Config,
    error::{StoreError, StoreResult},
    timestamp::Dialect,
};

/// Connection pool for either supported engine.
#[derive(Debug, Clone)]
pub enum DbPool {
    /// Embedded file (or in-memory) database
    Sqlite(SqlitePool),
    /// Client-server database
    Postgres(PgPool),
}

impl DbPool {
    /// Timestamp dialect of the engine behind this pool.
    pub fn dialect(&self) -> Dialect {
        match self {
            DbPool::Sqlite(_) => Dialect::Sqlite,
            DbPool::Postgres(_) => Dialect::Postgres,
        }
    }

    /// Close every connection in the pool.
    pub async fn close(&self) {
        match self {
            DbPool::Sqlite(pool) => pool.close().await,
            DbPool::Postgres(pool) => pool.close().await,
        }
    }
}

impl From<SqlitePool> for DbPool {
    fn from(pool: SqlitePool) -> Self {
        DbPool::Sqlite(pool)
    }
}

impl From<PgPool> for DbPool {
    fn from(pool: PgPool) -> Self {
        DbPool::Postgres(pool)
    }
}

/// Run the same expression against whichever concrete pool is present.
///
/// The body is expanded once per engine, so `sqlx` infers the database type
/// from the pool bound to `$pool` in each arm.
macro_rules! with_pool {
    ($db:expr, |$pool:ident| $body:expr) => {
        match $db {
            $crate::db::DbPool::Sqlite($pool) => $body,
            $crate::db::DbPool::Postgres($pool) => $body,
        }
    };
}
pub(crate) use with_pool;

/// Engine named by a database URL.
pub fn dialect_for_url(database_url: &str) -> StoreResult<Dialect> {
    let url = Url::parse(database_url)?;
    match url.scheme() {
        "sqlite" => Ok(Dialect::Sqlite),
        "postgres" | "postgresql" => Ok(Dialect::Postgres),
        other => Err(StoreError::UnsupportedDatabase(other.to_string())),
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Create a new connection pool for the configured engine.
///
/// # Configuration
///
/// - Maximum connections: `DATABASE_MAX_CONNECTIONS` (default 5)
/// - SQLite database files are created when missing
/// - In-memory SQLite databases live and die with their connection, so they
///   get exactly one connection that is never recycled
///
/// # Errors
///
/// Returns an error if:
/// - The URL is malformed or names an unsupported engine
/// - The database cannot be reached or authentication fails
pub async fn create_pool(config: &Config) -> StoreResult<DbPool> {
    let database_url = config.database_url.as_str();

    let pool = match dialect_for_url(database_url)? {
        Dialect::Sqlite => {
            let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

            let pool_options = if is_in_memory(database_url) {
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
            } else {
                SqlitePoolOptions::new().max_connections(config.database_max_connections)
            };

            DbPool::Sqlite(pool_options.connect_with(options).await?)
        }
        Dialect::Postgres => DbPool::Postgres(
            PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?,
        ),
    };

    tracing::info!(dialect = ?pool.dialect(), "Database pool created");
    Ok(pool)
}

/// Run the schema migrations matching the pool's engine.
///
/// Migration files live in `migrations/sqlite/` and `migrations/postgres/` and
/// are embedded at compile time. Applied migrations are tracked in the
/// `_sqlx_migrations` table, so each runs only once.
///
/// # Errors
///
/// Returns an error if a migration fails to apply.
pub async fn run_migrations(pool: &DbPool) -> StoreResult<()> {
    match pool {
        DbPool::Sqlite(pool) => sqlx::migrate!("./migrations/sqlite").run(pool).await?,
        DbPool::Postgres(pool) => sqlx::migrate!("./migrations/postgres").run(pool).await?,
    }

    tracing::info!("Database migrations complete");
    Ok(())
}

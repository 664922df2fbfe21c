//! Error types for the key and transaction store.
//!
//! Engine errors are carried verbatim. The only translation the store performs
//! is turning "zero rows" on a single-row fetch into [`StoreError::NotFound`].

/// Result alias used by every store operation.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store-wide error type.
///
/// # Error Categories
///
/// - **Engine Errors**: connectivity, constraint violations, malformed SQL
/// - **Lookup Errors**: a single-row fetch matched nothing
/// - **Timestamp Errors**: a bucketed timestamp prefix could not be parsed
/// - **Bootstrap Errors**: bad database URL, unsupported engine, failed migration
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed (connection error, constraint violation, query error).
    ///
    /// Wraps any `sqlx::Error` unchanged; callers decide how to interpret it.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested key or transaction does not exist.
    #[error("Not found")]
    NotFound,

    /// A stored timestamp could not be parsed on the aggregation path.
    #[error("Timestamp parse error: {0}")]
    Timestamp(#[from] chrono::ParseError),

    /// Applying schema migrations failed.
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// The database URL could not be parsed.
    #[error("Invalid database URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The database URL names an engine other than SQLite or PostgreSQL.
    #[error("Unsupported database scheme: {0}")]
    UnsupportedDatabase(String),
}

impl StoreError {
    /// Whether this is the distinguished "no rows" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }

    /// Whether the engine rejected the statement because of a duplicate primary key.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::Database(err)) => err.is_unique_violation(),
            _ => false,
        }
    }
}

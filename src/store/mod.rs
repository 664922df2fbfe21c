//! Key and transaction store.
//!
//! [`Store`] turns domain operations into parameterized statements against
//! either engine and hands rows back with timestamps in canonical form.
//!
//! # Statements
//!
//! Every operation is a single statement on a pooled connection. There is no
//! locking in the store; uniqueness races are settled by the engine. Dropping
//! a returned future cancels the in-flight query.

mod keys;
mod transactions;

use std::{fmt, sync::Arc};

use crate::{
    clock::{Clock, SystemClock},
    db::{DbPool, with_pool},
    error::StoreResult,
    timestamp::{Dialect, format_canonical},
};

/// Persistence layer for API keys and transactions.
#[derive(Clone)]
pub struct Store {
    pool: DbPool,
    dialect: Dialect,
    clock: Arc<dyn Clock>,
}

impl Store {
    /// Create a store over `pool`, taking "now" from `clock`.
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        let dialect = pool.dialect();
        Self {
            pool,
            dialect,
            clock,
        }
    }

    /// Create a store that reads the wall clock.
    pub fn with_system_clock(pool: DbPool) -> Self {
        Self::new(pool, Arc::new(SystemClock))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Verify the engine is reachable.
    pub async fn health(&self) -> StoreResult<()> {
        with_pool!(&self.pool, |pool| {
            sqlx::query("SELECT 1").execute(pool).await?;
        });

        Ok(())
    }

    /// Current time in the canonical write format.
    fn now_canonical(&self) -> String {
        format_canonical(self.clock.now())
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("pool", &self.pool)
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

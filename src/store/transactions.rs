//! Transaction operations and usage aggregation.

use chrono::{DateTime, Utc};

use crate::{
    db::with_pool,
    error::{StoreError, StoreResult},
    models::transaction::{
        Granularity, NewTransaction, Transaction, TransactionBucketRow, TransactionInfo,
        TransactionRow, bool_to_integer,
    },
    timestamp::{format_range_bound, hours_before},
};

use super::Store;

const TRANSACTION_COLUMNS: &str =
    "id, api_key, data_bytes, filename, secret, is_hash, created_at";

impl Store {
    /// Record a transaction stamped with the current time.
    ///
    /// # Errors
    ///
    /// A duplicate `id` surfaces as the engine's unique-violation error.
    #[tracing::instrument(level = "debug", skip(self, tx), fields(id = %tx.id, api_key = %tx.api_key))]
    pub async fn insert_transaction(&self, tx: &NewTransaction) -> StoreResult<()> {
        let created_at = self.now_canonical();

        with_pool!(&self.pool, |pool| {
            sqlx::query(
                r#"
                INSERT INTO transactions (created_at, id, api_key, data_bytes, filename, secret, is_hash)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(&created_at)
            .bind(&tx.id)
            .bind(&tx.api_key)
            .bind(tx.data_bytes)
            .bind(tx.filename.as_deref())
            .bind(tx.secret.as_deref())
            .bind(bool_to_integer(tx.is_hash))
            .execute(pool)
            .await?;
        });

        Ok(())
    }

    /// Fetch a transaction by id.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no transaction with this id
    /// - `Database`: engine error
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_transaction(&self, id: &str) -> StoreResult<Transaction> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1");

        let row = with_pool!(&self.pool, |pool| {
            sqlx::query_as::<_, TransactionRow>(&sql)
                .bind(id)
                .fetch_optional(pool)
                .await?
        })
        .ok_or(StoreError::NotFound)?;

        Ok(self.to_transaction(row))
    }

    /// List transactions, newest first.
    ///
    /// With `all` set every transaction is returned; otherwise only those
    /// recorded within the last `hours_back` hours (inclusive bound). A window
    /// reaching past the earliest representable instant returns every row.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_all_transactions(
        &self,
        all: bool,
        hours_back: i64,
    ) -> StoreResult<Vec<Transaction>> {
        let rows = if all {
            let sql = format!(
                "SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY created_at DESC"
            );
            with_pool!(&self.pool, |pool| {
                sqlx::query_as::<_, TransactionRow>(&sql)
                    .fetch_all(pool)
                    .await?
            })
        } else {
            let since = format_range_bound(hours_before(self.clock.now(), hours_back));
            let sql = format!(
                "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE created_at >= $1 ORDER BY created_at DESC"
            );
            with_pool!(&self.pool, |pool| {
                sqlx::query_as::<_, TransactionRow>(&sql)
                    .bind(&since)
                    .fetch_all(pool)
                    .await?
            })
        };

        Ok(rows.into_iter().map(|row| self.to_transaction(row)).collect())
    }

    /// Summarize transactions recorded in `[from, to)` per time bucket.
    ///
    /// Buckets are the canonical `created_at` text truncated to the
    /// granularity's prefix, newest bucket first. Bounds past year 9999 are
    /// clamped to `9999-12-31T23:59:59.999Z`, so `DateTime::<Utc>::MAX_UTC`
    /// works as an open end.
    ///
    /// # Errors
    ///
    /// - `Timestamp`: a bucket prefix did not parse; the whole call fails
    /// - `Database`: engine error
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_transaction_info(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        granularity: Granularity,
    ) -> StoreResult<Vec<TransactionInfo>> {
        let from = format_range_bound(from);
        let to = format_range_bound(to);

        let buckets = with_pool!(&self.pool, |pool| {
            sqlx::query_as::<_, TransactionBucketRow>(
                r#"
                SELECT SUBSTR(created_at, 0, $1) AS bucket,
                       COUNT(*) AS count,
                       CAST(COALESCE(SUM(data_bytes), 0) AS BIGINT) AS data_bytes
                FROM transactions
                WHERE created_at >= $2 AND created_at < $3
                GROUP BY bucket
                ORDER BY bucket DESC
                "#,
            )
            .bind(granularity.prefix_len())
            .bind(&from)
            .bind(&to)
            .fetch_all(pool)
            .await?
        });

        buckets
            .into_iter()
            .map(|bucket| bucket.into_info(granularity).map_err(StoreError::from))
            .collect()
    }

    fn to_transaction(&self, row: TransactionRow) -> Transaction {
        let mut tx = Transaction::from(row);
        self.dialect.normalize_lossy(&mut tx.created_at);
        tx
    }
}

//! API key operations.

use crate::{
    db::with_pool,
    error::{StoreError, StoreResult},
    models::key::{Key, KeyUsage, NewKey},
};

use super::Store;

const KEY_COLUMNS: &str = "api_key, private_key, public_key, address, created_at, revoked_at";

impl Store {
    /// Register a new, active key stamped with the current time.
    ///
    /// # Errors
    ///
    /// A duplicate `api_key` surfaces as the engine's unique-violation error
    /// (see [`StoreError::is_unique_violation`]).
    #[tracing::instrument(level = "debug", skip(self, key), fields(api_key = %key.api_key))]
    pub async fn insert_key(&self, key: &NewKey) -> StoreResult<()> {
        let created_at = self.now_canonical();

        with_pool!(&self.pool, |pool| {
            sqlx::query(
                r#"
                INSERT INTO keys (created_at, api_key, private_key, public_key, address)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(&created_at)
            .bind(&key.api_key)
            .bind(&key.private_key)
            .bind(&key.public_key)
            .bind(&key.address)
            .execute(pool)
            .await?;
        });

        Ok(())
    }

    /// Fetch a key by its API key, active or revoked.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no key with this API key
    /// - `Database`: engine error
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_key(&self, api_key: &str) -> StoreResult<Key> {
        let sql = format!("SELECT {KEY_COLUMNS} FROM keys WHERE api_key = $1 LIMIT 1");

        let mut key = with_pool!(&self.pool, |pool| {
            sqlx::query_as::<_, Key>(&sql)
                .bind(api_key)
                .fetch_optional(pool)
                .await?
        })
        .ok_or(StoreError::NotFound)?;

        self.normalize_key(&mut key);
        Ok(key)
    }

    /// List active keys, oldest first. Empty when none are registered.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_all_keys(&self) -> StoreResult<Vec<Key>> {
        let sql = format!(
            "SELECT {KEY_COLUMNS} FROM keys WHERE revoked_at IS NULL ORDER BY created_at"
        );

        let mut keys = with_pool!(&self.pool, |pool| {
            sqlx::query_as::<_, Key>(&sql).fetch_all(pool).await?
        });

        keys.iter_mut().for_each(|key| self.normalize_key(key));
        Ok(keys)
    }

    /// List active keys with the total bytes written through each, oldest first.
    ///
    /// Keys without transactions report zero bytes.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_all_keys_usage(&self) -> StoreResult<Vec<KeyUsage>> {
        let mut usage = with_pool!(&self.pool, |pool| {
            sqlx::query_as::<_, KeyUsage>(
                r#"
                SELECT k.api_key, k.private_key, k.public_key, k.address, k.created_at, k.revoked_at,
                       CAST(COALESCE(SUM(t.data_bytes), 0) AS BIGINT) AS data_bytes
                FROM keys k
                LEFT JOIN transactions t ON t.api_key = k.api_key
                WHERE k.revoked_at IS NULL
                GROUP BY k.api_key, k.private_key, k.public_key, k.address, k.created_at, k.revoked_at
                ORDER BY k.created_at
                "#,
            )
            .fetch_all(pool)
            .await?
        });

        usage
            .iter_mut()
            .for_each(|entry| self.normalize_key(&mut entry.key));
        Ok(usage)
    }

    /// Revoke a key, stamping `revoked_at` with the current time.
    ///
    /// Revoking an already revoked key succeeds and moves `revoked_at` to the
    /// new time. Unknown keys are not an error. Transactions recorded with the
    /// key are kept.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn deactivate_key(&self, api_key: &str) -> StoreResult<()> {
        let revoked_at = self.now_canonical();

        let updated = with_pool!(&self.pool, |pool| {
            sqlx::query("UPDATE keys SET revoked_at = $1 WHERE api_key = $2")
                .bind(&revoked_at)
                .bind(api_key)
                .execute(pool)
                .await?
                .rows_affected()
        });

        tracing::debug!(updated, "key deactivated");
        Ok(())
    }

    fn normalize_key(&self, key: &mut Key) {
        self.dialect.normalize_lossy(&mut key.created_at);
        if let Some(revoked_at) = key.revoked_at.as_mut() {
            self.dialect.normalize_lossy(revoked_at);
        }
    }
}

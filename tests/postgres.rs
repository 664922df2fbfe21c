//! Store behaviour against a live PostgreSQL server.
//!
//! Runs only when `TEST_POSTGRES_URL` points at a scratch database.

use std::sync::Arc;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use keyledger::{
    FixedClock, Store,
    config::Config,
    db,
    models::{key::NewKey, transaction::NewTransaction},
    timestamp::Dialect,
};

async fn setup() -> Result<Option<(Store, String)>> {
    let Ok(url) = std::env::var("TEST_POSTGRES_URL") else {
        return Ok(None);
    };

    let pool = db::create_pool(&Config::with_database_url(url)).await?;
    db::run_migrations(&pool).await?;

    let clock = FixedClock::new(Utc.with_ymd_and_hms(2021, 3, 4, 12, 0, 0).unwrap());
    let store = Store::new(pool, Arc::new(clock));

    // Rows persist between runs, so every run works on its own ids.
    let run = format!("{}-{}", std::process::id(), Utc::now().timestamp_micros());
    Ok(Some((store, run)))
}

#[tokio::test]
async fn keys_and_transactions_round_trip() -> Result<()> {
    let Some((store, run)) = setup().await? else {
        return Ok(());
    };
    assert_eq!(store.dialect(), Dialect::Postgres);
    store.health().await?;

    let api_key = format!("key-{run}");
    store
        .insert_key(&NewKey {
            api_key: api_key.clone(),
            private_key: "private".to_string(),
            public_key: "public".to_string(),
            address: "1address".to_string(),
        })
        .await?;

    let tx_id = format!("tx-{run}");
    store
        .insert_transaction(&NewTransaction {
            id: tx_id.clone(),
            api_key: api_key.clone(),
            data_bytes: 64,
            filename: None,
            secret: None,
            is_hash: true,
        })
        .await?;

    let key = store.get_key(&api_key).await?;
    assert_eq!(key.created_at, "2021-03-04T12:00:00.000Z");

    let tx = store.get_transaction(&tx_id).await?;
    assert!(tx.is_hash);
    assert_eq!(tx.data_bytes, 64);

    let usage = store.get_all_keys_usage().await?;
    let entry = usage
        .iter()
        .find(|entry| entry.key.api_key == api_key)
        .expect("active key is reported");
    assert_eq!(entry.data_bytes, 64);

    store.deactivate_key(&api_key).await?;
    assert!(store.get_all_keys().await?.iter().all(|k| k.api_key != api_key));
    assert!(store.get_transaction("missing").await.unwrap_err().is_not_found());
    Ok(())
}

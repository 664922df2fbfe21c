//! Keyledger - usage report entry point
//!
//! Connects to the configured store, brings its schema up to date and logs a
//! usage report: bytes written per active key and a bucketed summary of recent
//! transactions.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Check connectivity
//! 5. Log the usage report

use keyledger::{Clock, Store, SystemClock, config, db, timestamp::hours_before};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config).await?;
    db::run_migrations(&pool).await?;

    let store = Store::with_system_clock(pool.clone());
    store.health().await?;
    tracing::info!(dialect = ?store.dialect(), "Store healthy");

    for usage in store.get_all_keys_usage().await? {
        tracing::info!(
            api_key = %usage.key.api_key,
            address = %usage.key.address,
            created_at = %usage.key.created_at,
            data_bytes = usage.data_bytes,
            "Key usage"
        );
    }

    let granularity = config.report_granularity();
    let to = SystemClock.now();
    let from = hours_before(to, config.report_hours_back);
    let buckets = store.get_transaction_info(from, to, granularity).await?;
    tracing::info!(
        hours_back = config.report_hours_back,
        %granularity,
        buckets = buckets.len(),
        "Transaction summary"
    );
    for bucket in buckets {
        tracing::info!(
            timestamp = %bucket.timestamp,
            count = bucket.count,
            data_bytes = bucket.data_bytes,
            "Bucket"
        );
    }

    pool.close().await;
    Ok(())
}

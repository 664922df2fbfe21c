//! Store and report settings.
//!
//! Read from the process environment (plus an optional `.env` file) with
//! `envy`. Only the database URL is mandatory; the report binary's window and
//! bucket width have defaults.

use serde::Deserialize;

use crate::models::transaction::Granularity;

/// Settings for the store and the usage report.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): `sqlite://keyledger.db`, `sqlite::memory:` or a PostgreSQL connection string
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `REPORT_HOURS_BACK` (optional): window of the usage report, defaults to 24
/// - `REPORT_GRANULARITY` (optional): `none`, `minute`, `hour` or `day` (default)
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_hours_back")]
    pub report_hours_back: i64,

    #[serde(default)]
    pub report_granularity: Option<String>,
}

fn default_max_connections() -> u32 {
    5
}

fn default_hours_back() -> i64 {
    24
}

impl Config {
    /// Read settings from the environment, after merging a `.env` file when present.
    ///
    /// `DATABASE_URL` picks the engine: `sqlite://keyledger.db` or
    /// `sqlite:keyledger.db` for a file, `sqlite::memory:` for a throwaway
    /// database, `postgres://` / `postgresql://` for a server.
    ///
    /// # Errors
    ///
    /// Fails when `DATABASE_URL` is unset, or when `DATABASE_MAX_CONNECTIONS`
    /// or `REPORT_HOURS_BACK` is not a number.
    pub fn from_env() -> Result<Self, envy::Error> {
        // A missing .env file is fine.
        dotenvy::dotenv().ok();

        envy::from_env::<Config>()
    }

    /// Config pointing at `database_url` with every other setting defaulted.
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            database_max_connections: default_max_connections(),
            report_hours_back: default_hours_back(),
            report_granularity: None,
        }
    }

    pub fn report_granularity(&self) -> Granularity {
        self.report_granularity
            .as_deref()
            .map(|name| name.parse::<Granularity>().unwrap_or_default())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_only_url_is_set() {
        let vars = vec![("DATABASE_URL".to_string(), "sqlite::memory:".to_string())];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.report_hours_back, 24);
        assert_eq!(config.report_granularity(), Granularity::Day);
    }

    #[test]
    fn report_settings_are_read() {
        let vars = vec![
            ("DATABASE_URL".to_string(), "postgres://localhost/ledger".to_string()),
            ("REPORT_HOURS_BACK".to_string(), "6".to_string()),
            ("REPORT_GRANULARITY".to_string(), "hour".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.report_hours_back, 6);
        assert_eq!(config.report_granularity(), Granularity::Hour);
    }

    #[test]
    fn oversized_report_window_is_accepted() {
        let vars = vec![
            ("DATABASE_URL".to_string(), "sqlite:keyledger.db".to_string()),
            ("REPORT_HOURS_BACK".to_string(), i64::MAX.to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.report_hours_back, i64::MAX);
        assert_eq!(
            crate::db::dialect_for_url(&config.database_url).unwrap(),
            crate::timestamp::Dialect::Sqlite
        );
    }

    #[test]
    fn missing_url_is_an_error() {
        let vars: Vec<(String, String)> = Vec::new();
        assert!(envy::from_iter::<_, Config>(vars).is_err());
    }
}

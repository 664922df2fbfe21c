//! Transaction data models and usage aggregates.
//!
//! This module defines:
//! - `Transaction`: A recorded blockchain write
//! - `TransactionRow`: Its storage shape (`is_hash` as an INTEGER)
//! - `NewTransaction`: Fields supplied by the caller
//! - `Granularity` / `TransactionInfo`: Time-bucketed usage summaries

use std::{convert::Infallible, fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime, ParseError, Utc};
use serde::{Deserialize, Serialize};

/// Represents a transaction record returned to callers.
///
/// # Database Table
///
/// Maps to the `transactions` table, keyed by the caller-supplied `id`
/// (typically the blockchain transaction id). `api_key` references the key
/// the write was made with; revoking that key leaves the record in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Blockchain transaction id
    pub id: String,

    /// Key the transaction was written with
    pub api_key: String,

    /// Payload size in bytes
    pub data_bytes: i64,

    /// Original file name, when the payload came from a file
    pub filename: Option<String>,

    /// Encryption secret, present only for encrypted-mode writes
    pub secret: Option<String>,

    /// Whether only a hash of the payload was written on chain
    pub is_hash: bool,

    /// When the transaction was recorded
    pub created_at: String,
}

/// Storage shape of a transaction.
///
/// Both engines keep `is_hash` as an INTEGER column holding 0 or 1.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRow {
    pub id: String,
    pub api_key: String,
    pub data_bytes: i64,
    pub filename: Option<String>,
    pub secret: Option<String>,
    pub is_hash: i32,
    pub created_at: String,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Self {
            id: row.id,
            api_key: row.api_key,
            data_bytes: row.data_bytes,
            filename: row.filename,
            secret: row.secret,
            is_hash: row.is_hash != 0,
            created_at: row.created_at,
        }
    }
}

/// Integer stored for a boolean flag.
pub fn bool_to_integer(flag: bool) -> i32 {
    if flag { 1 } else { 0 }
}

/// Transaction recording payload.
///
/// The store assigns `created_at`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub id: String,
    pub api_key: String,
    pub data_bytes: i64,
    pub filename: Option<String>,
    pub secret: Option<String>,
    #[serde(default)]
    pub is_hash: bool,
}

/// Width of the time buckets used by usage summaries.
///
/// Buckets are formed by truncating the canonical timestamp text, so each
/// width corresponds to a fixed prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    /// One bucket per second
    None,
    Minute,
    Hour,
    /// One bucket per calendar day (UTC)
    #[default]
    Day,
}

const BUCKET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

impl Granularity {
    /// Length argument handed to `SUBSTR(created_at, 0, n)`.
    ///
    /// Starting at position 0 makes both engines return the first `n - 1`
    /// characters.
    pub fn prefix_len(self) -> i32 {
        match self {
            Granularity::None => 20,
            Granularity::Minute => 17,
            Granularity::Hour => 14,
            Granularity::Day => 11,
        }
    }

    /// Text completing a truncated prefix back to full seconds.
    fn completion(self) -> &'static str {
        match self {
            Granularity::None => "",
            Granularity::Minute => ":00",
            Granularity::Hour => ":00:00",
            Granularity::Day => "T00:00:00",
        }
    }

    /// Parse a truncated timestamp prefix into the start of its bucket.
    pub fn parse_bucket(self, prefix: &str) -> Result<DateTime<Utc>, ParseError> {
        let full = format!("{prefix}{}", self.completion());
        NaiveDateTime::parse_from_str(&full, BUCKET_FORMAT).map(|naive| naive.and_utc())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::None => "none",
            Granularity::Minute => "minute",
            Granularity::Hour => "hour",
            Granularity::Day => "day",
        }
    }
}

impl FromStr for Granularity {
    type Err = Infallible;

    /// Unrecognised names fall back to [`Granularity::Day`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "none" => Granularity::None,
            "minute" => Granularity::Minute,
            "hour" => Granularity::Hour,
            _ => Granularity::Day,
        })
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw bucket as returned by the aggregation query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionBucketRow {
    pub bucket: String,
    pub count: i64,
    pub data_bytes: i64,
}

/// Usage summary for one time bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
    /// Start of the bucket
    pub timestamp: DateTime<Utc>,

    /// Number of transactions in the bucket
    pub count: i64,

    /// Total payload size of those transactions
    pub data_bytes: i64,
}

impl TransactionBucketRow {
    pub fn into_info(self, granularity: Granularity) -> Result<TransactionInfo, ParseError> {
        Ok(TransactionInfo {
            timestamp: granularity.parse_bucket(&self.bucket)?,
            count: self.count,
            data_bytes: self.data_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const STORED: &str = "2021-03-04T12:34:56.789Z";

    /// Mirrors `SUBSTR(value, 0, n)`.
    fn truncate(value: &str, granularity: Granularity) -> &str {
        &value[..granularity.prefix_len() as usize - 1]
    }

    #[test]
    fn prefixes_parse_to_bucket_start() {
        let cases = [
            (Granularity::None, Utc.with_ymd_and_hms(2021, 3, 4, 12, 34, 56)),
            (Granularity::Minute, Utc.with_ymd_and_hms(2021, 3, 4, 12, 34, 0)),
            (Granularity::Hour, Utc.with_ymd_and_hms(2021, 3, 4, 12, 0, 0)),
            (Granularity::Day, Utc.with_ymd_and_hms(2021, 3, 4, 0, 0, 0)),
        ];

        for (granularity, expected) in cases {
            let prefix = truncate(STORED, granularity);
            assert_eq!(
                granularity.parse_bucket(prefix).unwrap(),
                expected.unwrap(),
                "granularity {granularity}"
            );
        }
    }

    #[test]
    fn prefix_lengths_match_storage_contract() {
        assert_eq!(truncate(STORED, Granularity::None), "2021-03-04T12:34:56");
        assert_eq!(truncate(STORED, Granularity::Minute), "2021-03-04T12:34");
        assert_eq!(truncate(STORED, Granularity::Hour), "2021-03-04T12");
        assert_eq!(truncate(STORED, Granularity::Day), "2021-03-04");
    }

    #[test]
    fn malformed_prefix_is_an_error() {
        assert!(Granularity::Minute.parse_bucket("2021-03-04 12:34").is_err());
        assert!(Granularity::Day.parse_bucket("").is_err());
    }

    #[test]
    fn unknown_granularity_falls_back_to_day() {
        assert_eq!("minute".parse::<Granularity>().unwrap(), Granularity::Minute);
        assert_eq!("HOUR".parse::<Granularity>().unwrap(), Granularity::Hour);
        assert_eq!("none".parse::<Granularity>().unwrap(), Granularity::None);
        assert_eq!("week".parse::<Granularity>().unwrap(), Granularity::Day);
        assert_eq!(Granularity::default(), Granularity::Day);
    }

    #[test]
    fn is_hash_maps_through_integer_storage() {
        assert_eq!(bool_to_integer(true), 1);
        assert_eq!(bool_to_integer(false), 0);

        let row = TransactionRow {
            id: "tx".to_string(),
            api_key: "key".to_string(),
            data_bytes: 10,
            filename: None,
            secret: None,
            is_hash: 1,
            created_at: STORED.to_string(),
        };
        assert!(Transaction::from(row).is_hash);
    }
}

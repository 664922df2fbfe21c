//! API key data models.
//!
//! This module defines:
//! - `Key`: Database entity representing a registered API key
//! - `NewKey`: Fields supplied by the caller when registering a key
//! - `KeyUsage`: A key together with the bytes written through it

use serde::{Deserialize, Serialize};

/// Represents an API key record from the database.
///
/// # Database Table
///
/// Maps to the `keys` table, keyed by `api_key`. A key is active while
/// `revoked_at` is `None`; once set it stays set.
///
/// # Timestamps
///
/// `created_at` and `revoked_at` are canonical UTC strings
/// (`2021-03-04T12:00:00.000Z`) by the time they leave the store.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    /// API key handed to clients; primary key
    pub api_key: String,

    /// Private half of the signing key pair
    pub private_key: String,

    /// Public half of the signing key pair
    pub public_key: String,

    /// On-chain address derived from the key pair
    pub address: String,

    /// When the key was registered
    pub created_at: String,

    /// When the key was revoked, `None` while active
    pub revoked_at: Option<String>,
}

impl Key {
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }
}

/// Key registration payload.
///
/// The store assigns `created_at`; new keys are always active.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewKey {
    pub api_key: String,
    pub private_key: String,
    pub public_key: String,
    pub address: String,
}

/// An active key and the total payload size of its transactions.
///
/// Keys without transactions report `data_bytes = 0`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyUsage {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub key: Key,

    /// Sum of `data_bytes` across every transaction recorded for this key
    pub data_bytes: i64,
}

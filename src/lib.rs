//! Keyledger - persistence for a blockchain write client.
//!
//! Registers API keys, records the blockchain transactions written with them
//! and reports usage. The same [`store::Store`] API runs on an embedded SQLite
//! file or a PostgreSQL server.
//!
//! # Architecture
//!
//! - **Database**: SQLite or PostgreSQL through sqlx (async queries)
//! - **Timestamps**: stored as canonical UTC text, normalized on every read
//! - **Time**: injected through [`clock::Clock`]

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod store;
pub mod timestamp;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{StoreError, StoreResult};
pub use store::Store;

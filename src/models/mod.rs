//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables.

/// API key model
pub mod key;
/// Blockchain transaction model and usage aggregates
pub mod transaction;

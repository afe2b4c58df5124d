//! SQLite backend for the scholar portal.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Accounts, sessions, and reset tokens
//! are stored as plain columns; everything else is stored as a JSON document
//! alongside the handful of columns needed for lookups and ordering.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;

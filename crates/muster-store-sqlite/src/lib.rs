//! SQLite backend for the Muster attendance roll.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Guarded writes run inside
//! `BEGIN IMMEDIATE` transactions, so concurrent stations sharing one
//! database file never act on a stale read.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

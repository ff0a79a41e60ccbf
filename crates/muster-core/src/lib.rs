//! Core types and trait definitions for the Muster attendance roll.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The store, API, server and kiosk crates all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod attendance;
pub mod clock;
pub mod decision;
pub mod error;
pub mod import;
pub mod recorder;
pub mod scan;
pub mod store;
pub mod student;

pub use error::{Error, Result};

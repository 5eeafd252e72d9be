//! Core types and the dialect contract for running a revisioned key-value
//! log on top of a relational database.
//!
//! This crate is deliberately free of database-driver dependencies. Backend
//! crates (e.g. `sqlkv-store-sqlite`) supply a concrete [`Dialect`] and
//! implement [`LogBackend`]; the log-structured engine above them only ever
//! sees the types defined here.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod dialect;
pub mod error;
pub mod placeholder;
pub mod record;
pub mod schema;
pub mod store;
pub mod template;

pub use dialect::{Dialect, ErrorClass, IsolationLevel};
pub use error::{BoxError, Error, Result};
pub use record::{COMPACT_REV_KEY, NewRecord, Record, Row};
pub use store::LogBackend;
pub use template::{Flavor, LimitStyle, TemplateSet};

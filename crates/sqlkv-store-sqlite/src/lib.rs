//! SQLite backend for the sqlkv revisioned log.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod store;

pub mod config;
pub mod dialect;
pub mod schema;

pub use config::SqliteConfig;
pub use sqlkv_core::{Error, Result};
pub use store::SqliteStore;

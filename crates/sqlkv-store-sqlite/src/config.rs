//! Runtime configuration for [`SqliteStore`](crate::SqliteStore).

use std::path::PathBuf;

use serde::Deserialize;

/// Deserialised from the `config` crate; every field has a default.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteConfig {
  /// Database file path.
  #[serde(default = "default_path")]
  pub path:             PathBuf,
  /// Number of schema migration slots to replay at startup (0 = none).
  #[serde(default)]
  pub schema_migration: u64,
}

fn default_path() -> PathBuf { PathBuf::from("./db/state.db") }

impl Default for SqliteConfig {
  fn default() -> Self { Self { path: default_path(), schema_migration: 0 } }
}

//! The SQLite [`Dialect`]: templates plus native error classification.

use rusqlite::ffi;
use sqlkv_core::{Dialect, ErrorClass, Flavor, IsolationLevel};

pub type SqliteDialect = Dialect<tokio_rusqlite::Error>;

pub fn dialect() -> SqliteDialect {
  Dialect::new("sqlite", &Flavor::SQLITE, classify, error_code)
    .with_insert_returning(true)
    .with_isolation(IsolationLevel::Serializable)
}

fn sqlite_failure(err: &tokio_rusqlite::Error) -> Option<&ffi::Error> {
  match err {
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _)) => Some(e),
    _ => None,
  }
}

/// Uniqueness violations on `(name, prev_revision)` (or a reused id) mean a
/// concurrent writer got there first.
pub fn classify(err: &tokio_rusqlite::Error) -> ErrorClass {
  match sqlite_failure(err) {
    Some(e)
      if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
        || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
    {
      ErrorClass::KeyExists
    }
    _ => ErrorClass::Other,
  }
}

/// The SQLite extended result code, or the message for non-SQLite failures.
pub fn error_code(err: &tokio_rusqlite::Error) -> String {
  match sqlite_failure(err) {
    Some(e) => e.extended_code.to_string(),
    None => err.to_string(),
  }
}

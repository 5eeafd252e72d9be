//! [`Dialect`] — the capability table a backend hands to the engine.
//!
//! A dialect is plain data plus two function pointers, built once at startup
//! and shared by reference. `E` is the backend driver's native error type.

use std::fmt;

use crate::{
  error::Error,
  template::{Flavor, TemplateSet},
};

/// Minimum isolation the engine should request for read-then-write
/// sequences. Advisory; enforcement belongs to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IsolationLevel {
  Default,
  ReadCommitted,
  RepeatableRead,
  Serializable,
}

/// Domain outcome of a native backend error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
  KeyExists,
  Other,
}

pub struct Dialect<E> {
  pub name:             &'static str,
  pub templates:        TemplateSet,
  /// Whether `templates.insert` returns the new id in the same round trip.
  pub insert_returning: bool,
  pub isolation:        IsolationLevel,
  pub classify:         fn(&E) -> ErrorClass,
  pub error_code:       fn(&E) -> String,
}

impl<E> Dialect<E>
where
  E: std::error::Error + Send + Sync + 'static,
{
  pub fn new(
    name: &'static str,
    flavor: &Flavor,
    classify: fn(&E) -> ErrorClass,
    error_code: fn(&E) -> String,
  ) -> Self {
    Self {
      name,
      templates: TemplateSet::build(flavor),
      insert_returning: true,
      isolation: IsolationLevel::Default,
      classify,
      error_code,
    }
  }

  pub fn with_insert_returning(mut self, insert_returning: bool) -> Self {
    self.insert_returning = insert_returning;
    self
  }

  pub fn with_isolation(mut self, isolation: IsolationLevel) -> Self {
    self.isolation = isolation;
    self
  }

  /// Classify a native error, keeping it as the source.
  pub fn translate_err(&self, err: E) -> Error {
    let code = (self.error_code)(&err);
    match (self.classify)(&err) {
      ErrorClass::KeyExists => Error::KeyExists { code, source: Box::new(err) },
      ErrorClass::Other => Error::Backend { code, source: Box::new(err) },
    }
  }

  /// The insert statement matching `insert_returning`.
  pub fn insert_sql(&self) -> &str {
    if self.insert_returning {
      &self.templates.insert
    } else {
      &self.templates.insert_last_insert_id
    }
  }
}

impl<E> fmt::Debug for Dialect<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Dialect")
      .field("name", &self.name)
      .field("insert_returning", &self.insert_returning)
      .field("isolation", &self.isolation)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, thiserror::Error)]
  #[error("native error {0}")]
  struct Native(u32);

  fn dialect() -> Dialect<Native> {
    Dialect::new(
      "test",
      &Flavor::ORACLE,
      |e: &Native| if e.0 == 1 { ErrorClass::KeyExists } else { ErrorClass::Other },
      |e: &Native| e.0.to_string(),
    )
  }

  #[test]
  fn unique_violation_becomes_key_exists() {
    let err = dialect().translate_err(Native(1));
    assert!(err.is_key_exists());
    assert_eq!(err.code(), "1");
  }

  #[test]
  fn other_errors_pass_through_with_source() {
    let err = dialect().translate_err(Native(12541));
    assert!(!err.is_key_exists());
    assert_eq!(err.code(), "12541");

    let source = std::error::Error::source(&err).expect("raw cause kept");
    assert_eq!(source.to_string(), "native error 12541");
  }

  #[test]
  fn insert_sql_follows_capability_flag() {
    let d = dialect();
    assert!(d.insert_sql().contains("RETURNING"));

    let d = d.with_insert_returning(false);
    assert!(!d.insert_sql().contains("RETURNING"));
  }
}

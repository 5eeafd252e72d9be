//! Error types for `sqlkv-core`.
//!
//! Backend errors never cross the core boundary unclassified: they are
//! wrapped in one of the variants below with the native error kept as the
//! `source` and a backend-specific code string alongside it.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
  /// A write lost a race on the `(name, prev_revision)` uniqueness
  /// constraint. Engines treat this as a compare-and-swap loss.
  #[error("key exists")]
  KeyExists {
    code:   String,
    #[source]
    source: BoxError,
  },

  #[error("backend error ({code}): {source}")]
  Backend {
    code:   String,
    #[source]
    source: BoxError,
  },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// A schema or migration statement failed during startup.
  #[error("schema setup failed executing {statement:?}: {source}")]
  Setup {
    statement: String,
    #[source]
    source:    Box<Error>,
  },
}

impl Error {
  pub fn is_key_exists(&self) -> bool { matches!(self, Self::KeyExists { .. }) }

  /// The backend-specific error code, for logging and metrics.
  pub fn code(&self) -> &str {
    match self {
      Self::KeyExists { code, .. } | Self::Backend { code, .. } => code,
      Self::Io(_) => "io",
      Self::Setup { source, .. } => source.code(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! The `LogBackend` trait: what the log-structured engine calls.
//!
//! Implemented by backend crates (e.g. `sqlkv-store-sqlite`) by executing the
//! statements of their [`Dialect`](crate::Dialect). Errors come back already
//! classified; a lost compare-and-swap surfaces as
//! [`Error::KeyExists`](crate::Error::KeyExists).

use std::future::Future;

use crate::{
  error::Result,
  record::{NewRecord, Record, Row},
};

/// Revisioned log operations over one relational backend.
///
/// `prefix` arguments are SQL `LIKE` patterns. A `limit` of zero or less
/// means unbounded.
pub trait LogBackend: Send + Sync {
  // ── Revisions ─────────────────────────────────────────────────────────

  /// Highest id in the log, or 0 when empty.
  fn current_revision(&self) -> impl Future<Output = Result<i64>> + Send + '_;

  /// Current compaction watermark, or 0 when never compacted.
  fn compact_revision(&self) -> impl Future<Output = Result<i64>> + Send + '_;

  /// Advance the watermark by appending a sentinel row. Racing writers of
  /// the same revision get `KeyExists`.
  fn set_compact_revision(&self, revision: i64) -> impl Future<Output = Result<()>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Point read of one record by id.
  fn get_revision(&self, id: i64) -> impl Future<Output = Result<Option<Record>>> + Send + '_;

  /// Latest record per name matching `prefix`, names after `start_key`.
  fn list_current<'a>(
    &'a self,
    prefix: &'a str,
    start_key: &'a str,
    limit: i64,
    include_deleted: bool,
  ) -> impl Future<Output = Result<Vec<Row>>> + Send + 'a;

  /// As [`list_current`](Self::list_current), but as of `revision`.
  fn list<'a>(
    &'a self,
    prefix: &'a str,
    start_key: &'a str,
    limit: i64,
    revision: i64,
    include_deleted: bool,
  ) -> impl Future<Output = Result<Vec<Row>>> + Send + 'a;

  /// `(current revision, number of rows list_current would return)`.
  fn count_current<'a>(
    &'a self,
    prefix: &'a str,
    start_key: &'a str,
  ) -> impl Future<Output = Result<(i64, i64)>> + Send + 'a;

  /// `(current revision, number of rows list would return at revision)`.
  fn count<'a>(
    &'a self,
    prefix: &'a str,
    start_key: &'a str,
    revision: i64,
  ) -> impl Future<Output = Result<(i64, i64)>> + Send + 'a;

  /// Every record matching `prefix` with id above `revision`, ascending.
  fn after<'a>(
    &'a self,
    prefix: &'a str,
    revision: i64,
    limit: i64,
  ) -> impl Future<Output = Result<Vec<Row>>> + Send + 'a;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Append a record, returning its id.
  fn insert(&self, record: NewRecord) -> impl Future<Output = Result<i64>> + Send + '_;

  /// Physically remove one record.
  fn delete_revision(&self, id: i64) -> impl Future<Output = Result<()>> + Send + '_;

  /// Remove everything at or below `revision` that no current or in-flight
  /// snapshot read above the watermark can observe. Returns rows removed.
  fn compact(&self, revision: i64) -> impl Future<Output = Result<u64>> + Send + '_;
}

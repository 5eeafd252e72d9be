//! The revisioned log record and the row shapes returned by queries.
//!
//! Every write appends one [`Record`]; history is never rewritten. The row
//! `id` is the global revision of that write.

use serde::{Deserialize, Serialize};

/// Name of the sentinel row whose `prev_revision` holds the compaction
/// watermark. It is not a real key.
pub const COMPACT_REV_KEY: &str = "compact_rev_key";

// ─── Records ─────────────────────────────────────────────────────────────────

/// One persisted version of a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
  /// Backend-assigned, strictly increasing. Doubles as the global revision.
  pub id:              i64,
  pub name:            String,
  pub created:         bool,
  /// Tombstone marker.
  pub deleted:         bool,
  /// Id of the record that started the current lifetime of this key.
  pub create_revision: i64,
  /// Id of the preceding version of this key, or 0 for the first one.
  pub prev_revision:   i64,
  /// Associated lease id, 0 when none.
  pub lease:           i64,
  pub value:           Vec<u8>,
  pub old_value:       Vec<u8>,
}

impl Record {
  /// Revision at which the current lifetime of the key began.
  ///
  /// Creations are written before their own id is known, so they carry a
  /// `create_revision` of 0 and report their own id instead.
  pub fn effective_create_revision(&self) -> i64 {
    if self.created && self.create_revision == 0 {
      self.id
    } else {
      self.create_revision
    }
  }
}

/// A record about to be appended. The id is assigned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
  pub name:            String,
  pub created:         bool,
  pub deleted:         bool,
  pub create_revision: i64,
  pub prev_revision:   i64,
  pub lease:           i64,
  pub value:           Vec<u8>,
  pub old_value:       Vec<u8>,
}

impl NewRecord {
  /// First version of a key that has never been written.
  ///
  /// Use [`recreate`](Self::recreate) once the key has a tombstone.
  pub fn create(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
    Self {
      name: name.into(),
      created: true,
      value: value.into(),
      ..Default::default()
    }
  }

  /// A new version superseding `prev`.
  pub fn update(prev: &Record, value: impl Into<Vec<u8>>) -> Self {
    Self {
      name:            prev.name.clone(),
      created:         false,
      deleted:         false,
      create_revision: prev.effective_create_revision(),
      prev_revision:   prev.id,
      lease:           prev.lease,
      value:           value.into(),
      old_value:       prev.value.clone(),
    }
  }

  /// First version of a new lifetime, chained after the tombstone that
  /// ended the previous one.
  pub fn recreate(tombstone: &Record, value: impl Into<Vec<u8>>) -> Self {
    Self {
      prev_revision: tombstone.id,
      ..Self::create(tombstone.name.clone(), value)
    }
  }

  /// A tombstone superseding `prev`.
  pub fn tombstone(prev: &Record) -> Self {
    Self {
      deleted: true,
      value: prev.value.clone(),
      ..Self::update(prev, Vec::<u8>::new())
    }
  }

  pub fn with_lease(mut self, lease: i64) -> Self {
    self.lease = lease;
    self
  }
}

// ─── Query rows ──────────────────────────────────────────────────────────────

/// A record as returned by the list and poll queries, prefixed with the
/// revision context read in the same statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
  /// Highest id in the table when the query ran.
  pub current_revision: i64,
  /// Compaction watermark when the query ran.
  pub compact_revision: i64,
  pub record:           Record,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn stored(id: i64, new: NewRecord) -> Record {
    Record {
      id,
      name: new.name,
      created: new.created,
      deleted: new.deleted,
      create_revision: new.create_revision,
      prev_revision: new.prev_revision,
      lease: new.lease,
      value: new.value,
      old_value: new.old_value,
    }
  }

  #[test]
  fn creation_reports_its_own_id() {
    let first = stored(7, NewRecord::create("/a", "v1"));
    assert_eq!(first.effective_create_revision(), 7);
  }

  #[test]
  fn update_chains_to_previous_version() {
    let first = stored(1, NewRecord::create("/a", "v1"));
    let next = NewRecord::update(&first, "v2");

    assert_eq!(next.prev_revision, 1);
    assert_eq!(next.create_revision, 1);
    assert_eq!(next.old_value, b"v1");
    assert!(!next.created);
  }

  #[test]
  fn recreate_chains_to_tombstone_with_fresh_lifetime() {
    let first = stored(1, NewRecord::create("/a", "v1"));
    let gone = stored(2, NewRecord::tombstone(&first));
    let again = NewRecord::recreate(&gone, "v2");

    assert!(again.created);
    assert!(!again.deleted);
    assert_eq!(again.name, "/a");
    assert_eq!(again.prev_revision, 2);
    assert_eq!(again.create_revision, 0);
    assert!(again.old_value.is_empty());
    assert_eq!(stored(3, again).effective_create_revision(), 3);
  }

  #[test]
  fn tombstone_keeps_last_value() {
    let first = stored(1, NewRecord::create("/a", "v1").with_lease(9));
    let gone = NewRecord::tombstone(&first);

    assert!(gone.deleted);
    assert_eq!(gone.value, b"v1");
    assert_eq!(gone.old_value, b"v1");
    assert_eq!(gone.lease, 9);
  }
}

//! Decoding of log rows read from SQLite.
//!
//! Column layout for every row-returning template: revision, compaction
//! revision, then the nine record columns. Nullable columns are read as
//! `Option` so sentinel rows and legacy data decode cleanly.

use sqlkv_core::{Record, Row};

/// Raw column values of one result row.
pub struct RawRow {
  pub current_revision: Option<i64>,
  pub compact_revision: Option<i64>,
  pub id:               i64,
  pub name:             Option<String>,
  pub created:          Option<bool>,
  pub deleted:          Option<bool>,
  pub create_revision:  Option<i64>,
  pub prev_revision:    Option<i64>,
  pub lease:            Option<i64>,
  pub value:            Option<Vec<u8>>,
  pub old_value:        Option<Vec<u8>>,
}

impl RawRow {
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawRow {
      current_revision: row.get(0)?,
      compact_revision: row.get(1)?,
      id:               row.get(2)?,
      name:             row.get(3)?,
      created:          row.get(4)?,
      deleted:          row.get(5)?,
      create_revision:  row.get(6)?,
      prev_revision:    row.get(7)?,
      lease:            row.get(8)?,
      value:            row.get(9)?,
      old_value:        row.get(10)?,
    })
  }

  pub fn into_row(self) -> Row {
    let mut record = Record {
      id:              self.id,
      name:            self.name.unwrap_or_default(),
      created:         self.created.unwrap_or(false),
      deleted:         self.deleted.unwrap_or(false),
      create_revision: self.create_revision.unwrap_or(0),
      prev_revision:   self.prev_revision.unwrap_or(0),
      lease:           self.lease.unwrap_or(0),
      value:           self.value.unwrap_or_default(),
      old_value:       self.old_value.unwrap_or_default(),
    };
    record.create_revision = record.effective_create_revision();

    Row {
      current_revision: self.current_revision.unwrap_or(0),
      compact_revision: self.compact_revision.unwrap_or(0),
      record,
    }
  }
}

//! SQL schema for the SQLite log table.

use sqlkv_core::schema::Schema;

/// Full schema; always the latest shape.
///
/// `AUTOINCREMENT` keeps ids from being reused once compaction has removed
/// the newest rows, so revisions stay strictly increasing.
pub const SCHEMA: Schema = Schema {
  exists_sql: "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
  table_name: "kine",
  statements: &[
    "CREATE TABLE kine (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        name            VARCHAR(630),
        created         INTEGER,
        deleted         INTEGER,
        create_revision INTEGER,
        prev_revision   INTEGER,
        lease           INTEGER,
        value           BLOB,
        old_value       BLOB
    )",
    "CREATE INDEX kine_name_index ON kine (name)",
    "CREATE INDEX kine_name_id_index ON kine (name, id)",
    "CREATE INDEX kine_id_deleted_index ON kine (id, deleted)",
    "CREATE INDEX kine_prev_revision_index ON kine (prev_revision)",
    "CREATE UNIQUE INDEX kine_name_prev_revision_uindex ON kine (name, prev_revision)",
    "CREATE INDEX kine_list_query_index ON kine (name, id DESC, deleted)",
  ],
  // Numbering is shared with the other backends; keep empty slots.
  migrations: &[
    "",
    "CREATE INDEX IF NOT EXISTS kine_list_query_index ON kine (name, id DESC, deleted)",
  ],
};

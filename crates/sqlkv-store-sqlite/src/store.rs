//! [`SqliteStore`] — the SQLite implementation of [`LogBackend`].

use std::sync::Arc;

use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tracing::debug;

use sqlkv_core::{
  IsolationLevel, LogBackend, NewRecord, Record, Result, Row,
  schema::{self, Installed, Schema, SchemaBackend},
};

use crate::{
  config::SqliteConfig,
  dialect::{SqliteDialect, dialect},
  encode::RawRow,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A revisioned log backed by a single SQLite file.
///
/// Cloning is cheap — the connection handle and dialect are shared.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  dialect: Arc<SqliteDialect>,
}

impl SqliteStore {
  /// Open (or create) the database at `config.path`, creating missing parent
  /// directories, and install the schema.
  pub async fn open(config: &SqliteConfig) -> Result<Self> {
    if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(parent).await?;
    }
    let d = dialect();
    let conn = tokio_rusqlite::Connection::open(&config.path)
      .await
      .map_err(|e| d.translate_err(e))?;
    let (store, _) = Self::with_dialect(conn, d, config.schema_migration).await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let d = dialect();
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(|e| d.translate_err(e))?;
    let (store, _) = Self::with_dialect(conn, d, 0).await?;
    Ok(store)
  }

  pub(crate) async fn with_dialect(
    conn: tokio_rusqlite::Connection,
    dialect: SqliteDialect,
    migration: u64,
  ) -> Result<(Self, Installed)> {
    let store = Self { conn, dialect: Arc::new(dialect) };
    store
      .call(|conn| {
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Ok(())
      })
      .await?;
    let installed = store.install(migration).await?;
    Ok((store, installed))
  }

  /// Run the schema installer against this store. Safe to repeat.
  pub async fn install(&self, migration: u64) -> Result<Installed> {
    schema::install(self, &SCHEMA, migration).await
  }

  pub fn dialect(&self) -> &SqliteDialect { &self.dialect }

  /// Run `f` on the connection thread, classifying any error.
  async fn call<F, R>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<R> + Send + 'static,
    R: Send + 'static,
  {
    self.conn.call(f).await.map_err(|e| self.dialect.translate_err(e))
  }

  /// Execute a row-returning template.
  async fn query_rows(&self, sql: String, params: Vec<rusqlite::types::Value>) -> Result<Vec<Row>> {
    let raws: Vec<RawRow> = self
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawRow::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawRow::into_row).collect())
  }

  /// Execute a `(revision, count)` template.
  async fn query_count(&self, sql: String, params: Vec<rusqlite::types::Value>) -> Result<(i64, i64)> {
    let (rev, count): (Option<i64>, i64) = self
      .call(move |conn| {
        Ok(conn.query_row(&sql, rusqlite::params_from_iter(params), |r| {
          Ok((r.get(0)?, r.get(1)?))
        })?)
      })
      .await?;
    Ok((rev.unwrap_or(0), count))
  }

  /// Execute a single-scalar template that may yield NULL.
  async fn query_scalar(&self, sql: String) -> Result<i64> {
    let value: Option<i64> = self
      .call(move |conn| Ok(conn.query_row(&sql, [], |r| r.get(0))?))
      .await?;
    Ok(value.unwrap_or(0))
  }

  fn behavior(&self) -> TransactionBehavior {
    match self.dialect.isolation {
      IsolationLevel::RepeatableRead | IsolationLevel::Serializable => TransactionBehavior::Immediate,
      IsolationLevel::Default | IsolationLevel::ReadCommitted => TransactionBehavior::Deferred,
    }
  }
}

fn text(s: &str) -> rusqlite::types::Value { rusqlite::types::Value::Text(s.to_owned()) }

fn int(i: i64) -> rusqlite::types::Value { rusqlite::types::Value::Integer(i) }

fn flag(b: bool) -> rusqlite::types::Value { int(b as i64) }

// ─── Schema installer hooks ──────────────────────────────────────────────────

impl SchemaBackend for SqliteStore {
  async fn table_exists(&self, schema: &Schema) -> Result<bool> {
    let (sql, table) = (schema.exists_sql, schema.table_name);
    self
      .call(move |conn| {
        Ok(
          conn
            .query_row(sql, rusqlite::params![table], |_| Ok(()))
            .optional()?
            .is_some(),
        )
      })
      .await
  }

  async fn execute(&self, statement: &str) -> Result<()> {
    let sql = statement.to_owned();
    self
      .call(move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
      })
      .await
  }
}

// ─── LogBackend impl ─────────────────────────────────────────────────────────

impl LogBackend for SqliteStore {
  // ── Revisions ─────────────────────────────────────────────────────────────

  async fn current_revision(&self) -> Result<i64> {
    self.query_scalar(self.dialect.templates.revision.clone()).await
  }

  async fn compact_revision(&self) -> Result<i64> {
    self.query_scalar(self.dialect.templates.compact_revision.clone()).await
  }

  async fn set_compact_revision(&self, revision: i64) -> Result<()> {
    let sql = self.dialect.templates.set_compact_revision.clone();
    self
      .call(move |conn| {
        conn.execute(&sql, rusqlite::params![revision])?;
        Ok(())
      })
      .await
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_revision(&self, id: i64) -> Result<Option<Record>> {
    let rows = self
      .query_rows(self.dialect.templates.get_revision.clone(), vec![int(id)])
      .await?;
    Ok(rows.into_iter().next().map(|r| r.record))
  }

  async fn list_current(
    &self,
    prefix:          &str,
    start_key:       &str,
    limit:           i64,
    include_deleted: bool,
  ) -> Result<Vec<Row>> {
    let t = &self.dialect.templates;
    let sql = t.limited(&t.get_current, limit);
    self
      .query_rows(sql, vec![text(prefix), text(start_key), flag(include_deleted)])
      .await
  }

  async fn list(
    &self,
    prefix:          &str,
    start_key:       &str,
    limit:           i64,
    revision:        i64,
    include_deleted: bool,
  ) -> Result<Vec<Row>> {
    let t = &self.dialect.templates;
    let (sql, params) = if start_key.is_empty() {
      (&t.list_revision_start, vec![text(prefix), int(revision), flag(include_deleted)])
    } else {
      (
        &t.get_revision_after,
        vec![text(prefix), text(start_key), int(revision), flag(include_deleted)],
      )
    };
    self.query_rows(t.limited(sql, limit), params).await
  }

  async fn count_current(&self, prefix: &str, start_key: &str) -> Result<(i64, i64)> {
    self
      .query_count(
        self.dialect.templates.count_current.clone(),
        vec![text(prefix), text(start_key), flag(false)],
      )
      .await
  }

  async fn count(&self, prefix: &str, start_key: &str, revision: i64) -> Result<(i64, i64)> {
    self
      .query_count(
        self.dialect.templates.count_revision.clone(),
        vec![text(prefix), text(start_key), int(revision), flag(false)],
      )
      .await
  }

  async fn after(&self, prefix: &str, revision: i64, limit: i64) -> Result<Vec<Row>> {
    let t = &self.dialect.templates;
    self
      .query_rows(t.limited(&t.after, limit), vec![text(prefix), int(revision)])
      .await
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn insert(&self, record: NewRecord) -> Result<i64> {
    let sql = self.dialect.insert_sql().to_owned();
    let returning = self.dialect.insert_returning;

    self
      .call(move |conn| {
        let params = rusqlite::params![
          record.name,
          record.created,
          record.deleted,
          record.create_revision,
          record.prev_revision,
          record.lease,
          record.value,
          record.old_value,
        ];
        if returning {
          Ok(conn.query_row(&sql, params, |r| r.get(0))?)
        } else {
          conn.execute(&sql, params)?;
          Ok(conn.last_insert_rowid())
        }
      })
      .await
  }

  async fn delete_revision(&self, id: i64) -> Result<()> {
    let sql = self.dialect.templates.delete.clone();
    self
      .call(move |conn| {
        conn.execute(&sql, rusqlite::params![id])?;
        Ok(())
      })
      .await
  }

  async fn compact(&self, revision: i64) -> Result<u64> {
    let watermark_sql = self.dialect.templates.compact_revision.clone();
    let compact_sql = self.dialect.templates.compact.clone();
    let behavior = self.behavior();

    let (target, deleted) = self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(behavior)?;
        let watermark: Option<i64> = tx.query_row(&watermark_sql, [], |r| r.get(0))?;
        // Never sweep past the durable watermark.
        let target = revision.min(watermark.unwrap_or(0));
        let deleted = if target > 0 {
          tx.execute(&compact_sql, rusqlite::params![target, target, target])?
        } else {
          0
        };
        tx.commit()?;
        Ok((target, deleted as u64))
      })
      .await?;

    debug!(requested = revision, target, deleted, "compacted log");
    Ok(deleted)
  }
}

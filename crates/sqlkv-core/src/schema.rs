//! Schema definition and the startup installer.
//!
//! A backend describes its table and indexes as a [`Schema`]. The statement
//! list always builds the latest shape; `migrations` only carry the deltas
//! that databases created at an older shape still need.

use tracing::{info, trace, warn};

use crate::error::{Error, Result};

/// DDL for one backend.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
  /// Introspection query taking the table name as its only parameter and
  /// returning a row iff the table exists.
  pub exists_sql: &'static str,
  /// Table name as the backend's catalog spells it.
  pub table_name: &'static str,
  /// Table and index creation, in order.
  pub statements: &'static [&'static str],
  /// Ordered deltas; empty entries are no-ops kept to align numbering
  /// across backends.
  pub migrations: &'static [&'static str],
}

/// What [`install`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Installed {
  pub created:            bool,
  pub migrations_applied: usize,
}

/// The two primitives the installer needs from a backend handle.
pub trait SchemaBackend {
  async fn table_exists(&self, schema: &Schema) -> Result<bool>;

  async fn execute(&self, statement: &str) -> Result<()>;
}

/// Bring the backend to the current schema.
///
/// Creates the table and indexes if absent, then replays migrations with
/// index below `migration`. Any failing statement aborts the run.
pub async fn install<B>(backend: &B, schema: &Schema, migration: u64) -> Result<Installed>
where
  B: SchemaBackend,
{
  info!("Configuring database table schema and indexes, this may take a moment...");

  let exists = match backend.table_exists(schema).await {
    Ok(exists) => exists,
    Err(e) => {
      warn!(
        table = schema.table_name,
        code = e.code(),
        "failed to check existence of database table, going to attempt create: {e}"
      );
      false
    }
  };

  if !exists {
    for stmt in schema.statements {
      run(backend, "SETUP EXEC", stmt).await?;
    }
  }

  let mut migrations_applied = 0;
  for (i, stmt) in schema.migrations.iter().enumerate() {
    if (i as u64) >= migration {
      break;
    }
    if stmt.is_empty() {
      continue;
    }
    run(backend, &format!("SETUP EXEC MIGRATION {i}"), stmt).await?;
    migrations_applied += 1;
  }

  info!("Database tables and indexes are up to date");
  Ok(Installed { created: !exists, migrations_applied })
}

async fn run<B: SchemaBackend>(backend: &B, label: &str, stmt: &str) -> Result<()> {
  trace!("{label}: {}", stripped(stmt));
  backend
    .execute(stmt)
    .await
    .map_err(|e| Error::Setup { statement: stripped(stmt), source: Box::new(e) })
}

/// Collapse runs of whitespace so multi-line SQL logs on one line.
pub fn stripped(sql: &str) -> String { sql.split_whitespace().collect::<Vec<_>>().join(" ") }

//! `sqlkv` — operator tool for a SQLite-backed revisioned log.
//!
//! Reads `sqlkv.toml` (or the path given with `--config`), overlaid by
//! `KINE_*` environment variables, opens the store (installing or migrating
//! the schema), then runs one command.
//!
//! ```
//! KINE_SCHEMA_MIGRATION=2 sqlkv --db ./db/state.db init
//! sqlkv list '/registry/%' --revision 42
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sqlkv_core::{LogBackend, Record, Row};
use sqlkv_store_sqlite::{SqliteConfig, SqliteStore};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Inspect and maintain a sqlkv database")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "sqlkv.toml")]
  config: PathBuf,

  /// Database file; overrides `path` from the configuration.
  #[arg(long)]
  db: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create or migrate the schema and exit.
  Init,
  /// Print the current and compaction revisions.
  Status,
  /// Print one record by revision.
  Get { id: i64 },
  /// List the latest record per key matching a LIKE pattern.
  List {
    prefix:          String,
    /// Read as of this revision instead of the current one.
    #[arg(long)]
    revision:        Option<i64>,
    #[arg(long, default_value_t = 0)]
    limit:           i64,
    #[arg(long)]
    include_deleted: bool,
  },
  /// Print every record above a revision, oldest first.
  After {
    prefix:   String,
    revision: i64,
    #[arg(long, default_value_t = 0)]
    limit:    i64,
  },
  /// Advance the compaction watermark and sweep history below it.
  Compact { revision: i64 },
}

// ─── Output ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct RecordView<'a> {
  id:              i64,
  name:            &'a str,
  created:         bool,
  deleted:         bool,
  create_revision: i64,
  prev_revision:   i64,
  lease:           i64,
  value:           String,
  old_value:       String,
}

impl<'a> From<&'a Record> for RecordView<'a> {
  fn from(r: &'a Record) -> Self {
    Self {
      id:              r.id,
      name:            &r.name,
      created:         r.created,
      deleted:         r.deleted,
      create_revision: r.create_revision,
      prev_revision:   r.prev_revision,
      lease:           r.lease,
      value:           String::from_utf8_lossy(&r.value).into_owned(),
      old_value:       String::from_utf8_lossy(&r.old_value).into_owned(),
    }
  }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

fn print_rows(rows: &[Row]) -> anyhow::Result<()> {
  let views: Vec<RecordView<'_>> = rows.iter().map(|r| RecordView::from(&r.record)).collect();
  print_json(&views)
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("KINE").try_parsing(true))
    .build()
    .context("failed to read config file")?;

  let mut store_cfg: SqliteConfig = settings
    .try_deserialize()
    .context("failed to deserialise SqliteConfig")?;
  if let Some(db) = cli.db {
    store_cfg.path = db;
  }

  let store = SqliteStore::open(&store_cfg)
    .await
    .with_context(|| format!("failed to open store at {:?}", store_cfg.path))?;

  match cli.command {
    Command::Init => {
      tracing::info!(path = ?store_cfg.path, "schema ready");
    }
    Command::Status => {
      let current = store.current_revision().await?;
      let compact = store.compact_revision().await?;
      print_json(&serde_json::json!({
        "current_revision": current,
        "compact_revision": compact,
      }))?;
    }
    Command::Get { id } => match store.get_revision(id).await? {
      Some(record) => print_json(&RecordView::from(&record))?,
      None => anyhow::bail!("no record at revision {id}"),
    },
    Command::List { prefix, revision, limit, include_deleted } => {
      let rows = match revision {
        Some(rev) => store.list(&prefix, "", limit, rev, include_deleted).await?,
        None => store.list_current(&prefix, "", limit, include_deleted).await?,
      };
      print_rows(&rows)?;
    }
    Command::After { prefix, revision, limit } => {
      print_rows(&store.after(&prefix, revision, limit).await?)?;
    }
    Command::Compact { revision } => {
      let watermark = store.compact_revision().await?;
      if revision > watermark {
        match store.set_compact_revision(revision).await {
          Ok(()) => {}
          // Someone else recorded the same watermark; sweeping is still safe.
          Err(e) if e.is_key_exists() => {
            tracing::debug!(revision, "compaction watermark already recorded");
          }
          Err(e) => return Err(e).context("failed to record compaction watermark"),
        }
      }
      let deleted = store.compact(revision).await?;
      tracing::info!(revision, deleted, "compaction finished");
    }
  }

  Ok(())
}

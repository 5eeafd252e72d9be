//! The fixed query vocabulary of the revisioned log.
//!
//! All list variants share one skeleton: per matching name, pick the newest
//! eligible id, join back for the full row, and filter tombstones. Variants
//! differ only in the predicate spliced into the inner `GROUP BY` query.
//! Backend differences are captured by a [`Flavor`]; [`TemplateSet::build`]
//! renders every template and translates its placeholders exactly once.

use crate::{placeholder::Placeholder, record::COMPACT_REV_KEY};

/// Name of the single table holding every record.
pub const TABLE: &str = "kine";

/// Column list shared by every row-returning template. The first two
/// columns of list rows (revision context) precede these.
const COLUMNS: &str = "kv.id AS theid, kv.name AS thename, kv.created, \
                       kv.deleted, kv.create_revision, kv.prev_revision, \
                       kv.lease, kv.value, kv.old_value";

const INSERT_COLUMNS: &str =
  "name, created, deleted, create_revision, prev_revision, lease, value, old_value";

// ─── Row limiting ────────────────────────────────────────────────────────────

/// How a backend caps the number of returned rows: a trailing `LIMIT`
/// clause, or the standard `FETCH FIRST` row-limiting verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitStyle {
  /// `... LIMIT n`
  Trailing,
  /// `... FETCH FIRST n ROWS ONLY`
  FetchFirst,
}

impl LimitStyle {
  /// Cap `sql` at `limit` rows. Non-positive limits leave it unbounded.
  pub fn apply(&self, sql: &str, limit: i64) -> String {
    if limit <= 0 {
      return sql.to_owned();
    }
    match self {
      Self::Trailing => format!("{sql} LIMIT {limit}"),
      Self::FetchFirst => format!("{sql} FETCH FIRST {limit} ROWS ONLY"),
    }
  }
}

// ─── Flavors ─────────────────────────────────────────────────────────────────

/// The syntax knobs that differ between relational engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flavor {
  pub placeholder: Placeholder,
  pub limit:       LimitStyle,
  /// Expression compared against `name` for the "start after this key"
  /// cursor. Must contain exactly one `?` and treat an empty string as
  /// "before every key".
  pub name_floor:  &'static str,
  /// Appended to scalar-only `SELECT`s (e.g. ` FROM dual`).
  pub scalar_from: &'static str,
  /// Appended to the insert to return the new id in one round trip.
  pub returning:   &'static str,
}

impl Flavor {
  pub const ORACLE: Flavor = Flavor {
    placeholder: Placeholder::Numbered(":"),
    limit:       LimitStyle::FetchFirst,
    name_floor:  "NVL(?, CHR(1))",
    scalar_from: " FROM dual",
    returning:   " RETURNING id INTO ?",
  };
  pub const SQLITE: Flavor = Flavor {
    placeholder: Placeholder::Numbered("?"),
    limit:       LimitStyle::Trailing,
    name_floor:  "?",
    scalar_from: "",
    returning:   " RETURNING id",
  };
}

// ─── Templates ───────────────────────────────────────────────────────────────

/// Every statement the engine issues, rendered for one backend.
///
/// Parameter order for each template is documented on its field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
  /// `(id)` → one row with zeroed revision context.
  pub get_revision:          String,
  /// `(prefix, start_key, include_deleted)`
  pub get_current:           String,
  /// `(prefix, revision, include_deleted)`
  pub list_revision_start:   String,
  /// `(prefix, start_key, revision, include_deleted)`
  pub get_revision_after:    String,
  /// `(prefix, start_key, include_deleted)` → `(revision, count)`
  pub count_current:         String,
  /// `(prefix, start_key, revision, include_deleted)` → `(revision, count)`
  pub count_revision:        String,
  /// `(prefix, revision)`; every row above the floor, ascending by id.
  pub after:                 String,
  /// `(id)`
  pub delete:                String,
  /// No parameters; current maximum id.
  pub revision:              String,
  /// No parameters; current compaction watermark.
  pub compact_revision:      String,
  /// Record columns in [`NewRecord`](crate::NewRecord) order, returning the
  /// new id.
  pub insert:                String,
  /// Same parameters as `insert`, without a returning clause.
  pub insert_last_insert_id: String,
  /// `(revision)`; appends a new watermark sentinel.
  pub set_compact_revision:  String,
  /// `(revision, revision, revision)`; physically removes superseded rows.
  pub compact:               String,
  pub limit:                 LimitStyle,
}

impl TemplateSet {
  pub fn build(flavor: &Flavor) -> Self {
    let q = |sql: String| flavor.placeholder.rewrite(&sql);
    let revision = revision_sql();
    let compact_revision = compact_revision_sql();
    let floor = format!("AND mkv.name > {}", flavor.name_floor);

    let count = |predicate: &str| {
      format!(
        "SELECT ({revision}), (SELECT COUNT(c.theid) FROM ({list}) c){from}",
        list = list_sql(predicate),
        from = flavor.scalar_from,
      )
    };

    let insert = format!(
      "INSERT INTO {TABLE} ({INSERT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
    );

    Self {
      get_revision: q(format!(
        "SELECT 0, 0, {COLUMNS} FROM {TABLE} kv WHERE kv.id = ?"
      )),
      get_current: q(list_sql(&floor)),
      list_revision_start: q(list_sql("AND mkv.id <= ?")),
      get_revision_after: q(list_sql("AND mkv.name > ? AND mkv.id <= ?")),
      count_current: q(count(&floor)),
      count_revision: q(count(&format!("{floor} AND mkv.id <= ?"))),
      after: q(format!(
        "SELECT ({revision}), ({compact_revision}), {COLUMNS}
         FROM {TABLE} kv
         WHERE kv.name LIKE ? AND kv.id > ?
         ORDER BY kv.id ASC"
      )),
      delete: q(format!("DELETE FROM {TABLE} WHERE id = ?")),
      insert: q(format!("{insert}{}", flavor.returning)),
      insert_last_insert_id: q(insert),
      set_compact_revision: q(format!(
        "INSERT INTO {TABLE} ({INSERT_COLUMNS})
         VALUES ('{COMPACT_REV_KEY}', 0, 0, 0, ?, 0, NULL, NULL)"
      )),
      compact: q(format!(
        "DELETE FROM {TABLE} WHERE id IN (
           SELECT kp.prev_revision FROM {TABLE} kp
           WHERE kp.name != '{COMPACT_REV_KEY}' AND kp.prev_revision != 0 AND kp.id <= ?
           UNION
           SELECT kd.id FROM {TABLE} kd
           WHERE kd.deleted != 0 AND kd.id <= ?
           UNION
           SELECT kc.id FROM {TABLE} kc
           WHERE kc.name = '{COMPACT_REV_KEY}' AND kc.prev_revision < ?
         )"
      )),
      revision,
      compact_revision,
      limit: flavor.limit,
    }
  }

  /// Apply the backend's row cap to a rendered template.
  pub fn limited(&self, sql: &str, limit: i64) -> String { self.limit.apply(sql, limit) }
}

fn revision_sql() -> String { format!("SELECT MAX(rkv.id) AS id FROM {TABLE} rkv") }

fn compact_revision_sql() -> String {
  format!(
    "SELECT MAX(crkv.prev_revision) AS prev_revision FROM {TABLE} crkv \
     WHERE crkv.name = '{COMPACT_REV_KEY}'"
  )
}

/// Latest row per name among rows matching `name LIKE ?` plus `predicate`,
/// hiding tombstones unless the trailing parameter is 1.
fn list_sql(predicate: &str) -> String {
  format!(
    "SELECT *
     FROM (
       SELECT ({revision}), ({compact_revision}), {COLUMNS}
       FROM {TABLE} kv
       JOIN (
         SELECT MAX(mkv.id) AS id
         FROM {TABLE} mkv
         WHERE mkv.name LIKE ?
           {predicate}
         GROUP BY mkv.name) maxkv
         ON maxkv.id = kv.id
       WHERE kv.deleted = 0 OR kv.deleted = ?
     ) lkv
     ORDER BY lkv.thename ASC",
    revision = revision_sql(),
    compact_revision = compact_revision_sql(),
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  fn markers(sql: &str, prefix: char) -> Vec<usize> {
    let mut out = vec![];
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
      if c == prefix {
        let mut digits = String::new();
        while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
          digits.push(*d);
          chars.next();
        }
        if let Ok(n) = digits.parse() {
          out.push(n);
        }
      }
    }
    out
  }

  #[test]
  fn parameter_counts_match_documented_order() {
    let t = TemplateSet::build(&Flavor::SQLITE);
    assert_eq!(markers(&t.get_revision, '?'), vec![1]);
    assert_eq!(markers(&t.get_current, '?'), vec![1, 2, 3]);
    assert_eq!(markers(&t.list_revision_start, '?'), vec![1, 2, 3]);
    assert_eq!(markers(&t.get_revision_after, '?'), vec![1, 2, 3, 4]);
    assert_eq!(markers(&t.count_current, '?'), vec![1, 2, 3]);
    assert_eq!(markers(&t.count_revision, '?'), vec![1, 2, 3, 4]);
    assert_eq!(markers(&t.after, '?'), vec![1, 2]);
    assert_eq!(markers(&t.delete, '?'), vec![1]);
    assert_eq!(markers(&t.insert, '?'), (1..=8).collect::<Vec<_>>());
    assert_eq!(markers(&t.set_compact_revision, '?'), vec![1]);
    assert_eq!(markers(&t.compact, '?'), vec![1, 2, 3]);
    assert!(markers(&t.revision, '?').is_empty());
    assert!(markers(&t.compact_revision, '?').is_empty());
  }

  #[test]
  fn oracle_parameter_counts_match_documented_order() {
    let t = TemplateSet::build(&Flavor::ORACLE);
    assert_eq!(markers(&t.get_current, ':'), vec![1, 2, 3]);
    assert_eq!(markers(&t.get_revision_after, ':'), vec![1, 2, 3, 4]);
    assert_eq!(markers(&t.count_current, ':'), vec![1, 2, 3]);
    assert_eq!(markers(&t.count_revision, ':'), vec![1, 2, 3, 4]);
    assert_eq!(markers(&t.after, ':'), vec![1, 2]);
    assert_eq!(markers(&t.compact, ':'), vec![1, 2, 3]);
    assert_eq!(markers(&t.insert, ':'), (1..=9).collect::<Vec<_>>());
    assert!(t.count_revision.contains("NVL(:2, CHR(1)) AND mkv.id <= :3"));
    assert!(t.count_revision.ends_with("FROM dual"));
  }

  #[test]
  fn oracle_flavor_uses_its_own_syntax() {
    let t = TemplateSet::build(&Flavor::ORACLE);
    assert!(t.get_current.contains("NVL(:2, CHR(1))"));
    assert!(t.count_current.ends_with("FROM dual"));
    assert!(t.insert.ends_with("RETURNING id INTO :9"));
    assert!(!t.insert_last_insert_id.contains("RETURNING"));
    assert!(!t.get_current.contains('?'));
    assert_eq!(
      t.limited("SELECT 1", 5),
      "SELECT 1 FETCH FIRST 5 ROWS ONLY"
    );
  }

  #[test]
  fn sentinel_literal_survives_translation() {
    let t = TemplateSet::build(&Flavor::ORACLE);
    assert!(t.compact_revision.contains("'compact_rev_key'"));
    assert!(t.set_compact_revision.contains("'compact_rev_key', 0, 0, 0, :1"));
  }

  #[test]
  fn list_variants_share_one_skeleton() {
    let t = TemplateSet::build(&Flavor::SQLITE);
    for sql in [&t.get_current, &t.list_revision_start, &t.get_revision_after] {
      assert!(sql.contains("GROUP BY mkv.name"));
      assert!(sql.contains("ORDER BY lkv.thename ASC"));
    }
    assert!(t.list_revision_start.contains("AND mkv.id <= ?2"));
    assert!(t.get_revision_after.contains("AND mkv.name > ?2 AND mkv.id <= ?3"));
  }

  #[test]
  fn limit_styles() {
    assert_eq!(LimitStyle::Trailing.apply("SELECT 1", 10), "SELECT 1 LIMIT 10");
    assert_eq!(LimitStyle::Trailing.apply("SELECT 1", 0), "SELECT 1");
    assert_eq!(LimitStyle::FetchFirst.apply("SELECT 1", 3), "SELECT 1 FETCH FIRST 3 ROWS ONLY");
    assert_eq!(LimitStyle::FetchFirst.apply("SELECT 1", -1), "SELECT 1");
  }
}

//! Rewriting of generic `?` markers into a backend's binding syntax.
//!
//! Templates are authored with bare `?` markers. [`Placeholder::rewrite`] is
//! applied once per template when a [`TemplateSet`](crate::TemplateSet) is
//! built; the Nth `?` becomes the Nth backend marker. Markers inside
//! single-quoted string literals are left alone.

/// The binding syntax a backend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
  /// Bare positional `?`; rewriting is the identity.
  Positional,
  /// Sequentially numbered markers: `$1`, `:1`, `?1`, ...
  Numbered(&'static str),
}

impl Placeholder {
  pub fn rewrite(&self, sql: &str) -> String {
    match self {
      Self::Positional => sql.to_owned(),
      Self::Numbered(prefix) => number(sql, prefix),
    }
  }
}

fn number(sql: &str, prefix: &str) -> String {
  let mut out = String::with_capacity(sql.len() + 16);
  let mut n = 0usize;
  let mut in_literal = false;

  for c in sql.chars() {
    match c {
      '\'' => {
        in_literal = !in_literal;
        out.push(c);
      }
      '?' if !in_literal => {
        n += 1;
        out.push_str(prefix);
        out.push_str(&n.to_string());
      }
      _ => out.push(c),
    }
  }
  out
}

//! The validation gate between generated text and the database.
//!
//! Three checks, strongest first refusal wins:
//!   1. the text must start with a SQL verb, else it is not SQL at all;
//!   2. under the default read-only policy only `SELECT` passes;
//!   3. multi-statement payloads are rejected and every table referenced
//!      after `FROM`/`JOIN`/`INTO`/`UPDATE` must be one of the four
//!      schema tables.
//!
//! This is deliberately not a full SQL parser: it cannot catch every
//! hostile statement, and it will reject the odd exotic-but-legitimate
//! construct (e.g. an expression keyword that looks like a table
//! position). It exists so the obvious injection shapes never reach the
//! database.

use crate::error::{Error, Result};

/// The only tables generated SQL may reference.
pub const KNOWN_TABLES: [&str; 4] =
  ["merchants", "locations", "users", "fraud_data"];

/// Whether the bridge may execute statements that mutate the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePolicy {
  /// Only `SELECT` statements pass. The default.
  ReadOnly,
  /// `INSERT`/`UPDATE`/`DELETE` also pass. Opt-in, at the operator's
  /// own risk.
  AllowWrites,
}

/// A statement that passed the gate. The only way to obtain one is
/// [`validate`], so store backends can demand it at the type level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSql(String);

impl ValidatedSql {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl AsRef<str> for ValidatedSql {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

/// Run `sql` through the gate under `policy`.
pub fn validate(sql: &str, policy: GatePolicy) -> Result<ValidatedSql> {
  let sql = sql.trim();

  let verb = sql
    .split_whitespace()
    .next()
    .unwrap_or("")
    .to_ascii_lowercase();
  if !matches!(verb.as_str(), "select" | "insert" | "update" | "delete") {
    return Err(Error::NotASqlStatement(sql.to_string()));
  }

  if policy == GatePolicy::ReadOnly && verb != "select" {
    return Err(Error::Rejected(format!(
      "only SELECT statements are permitted under the read-only policy \
       (got {verb:?})"
    )));
  }

  reject_multiple_statements(sql)?;
  check_table_references(sql)?;

  Ok(ValidatedSql(sql.to_string()))
}

// ─── Multi-statement rejection ───────────────────────────────────────────────

/// Reject any `;` outside string literals that has content after it.
/// A single trailing semicolon is fine.
fn reject_multiple_statements(sql: &str) -> Result<()> {
  let mut quote: Option<char> = None;

  for (i, c) in sql.char_indices() {
    match (quote, c) {
      (Some(q), _) if c == q => quote = None,
      (Some(_), _) => {}
      (None, '\'' | '"') => quote = Some(c),
      (None, ';') => {
        if sql[i + 1..].chars().any(|c| !c.is_whitespace()) {
          return Err(Error::Rejected(
            "multiple SQL statements are not permitted".to_string(),
          ));
        }
      }
      _ => {}
    }
  }
  Ok(())
}

// ─── Table allow-list ────────────────────────────────────────────────────────

/// Check that every identifier in table position names a known table.
///
/// `FROM`/`JOIN`/`INTO`/`UPDATE` opens a table list at the current
/// parenthesis depth; within it, each identifier after the keyword or a
/// same-depth comma must be a known table (aliases in between are
/// ignored). A `select` in table position is a derived table whose own
/// `FROM` clauses get scanned the same way. System catalogs like
/// `sqlite_master` are outside the allow-list on purpose.
fn check_table_references(sql: &str) -> Result<()> {
  let blanked = blank_string_literals(sql)
    .to_ascii_lowercase()
    .replace('(', " ( ")
    .replace(')', " ) ")
    .replace(',', " , ")
    .replace(';', " ");
  let tokens: Vec<&str> = blanked.split_whitespace().collect();

  // Parenthesis depths at which a table list is currently open.
  let mut lists: Vec<usize> = Vec::new();
  let mut depth = 0usize;
  let mut expect_table = false;

  for token in tokens {
    match token {
      "(" => depth += 1,
      ")" => {
        depth = depth.saturating_sub(1);
        while lists.last().is_some_and(|d| *d > depth) {
          lists.pop();
        }
        expect_table = false;
      }
      "," => {
        if lists.last() == Some(&depth) {
          expect_table = true;
        }
      }
      "from" | "join" | "into" | "update" => {
        if lists.last() != Some(&depth) {
          lists.push(depth);
        }
        expect_table = true;
      }
      "select" if expect_table => expect_table = false,
      _ if expect_table => {
        if KNOWN_TABLES.contains(&token) {
          expect_table = false;
        } else {
          return Err(Error::Rejected(format!(
            "statement references unknown table {token:?}"
          )));
        }
      }
      _ if ends_table_list(token) => {
        if lists.last() == Some(&depth) {
          lists.pop();
        }
      }
      _ => {}
    }
  }
  Ok(())
}

/// Clause keywords after which a same-depth comma no longer separates
/// table names. `ON`/`USING` are absent deliberately: a comma-join may
/// legally follow them, so the list stays open across join conditions.
fn ends_table_list(token: &str) -> bool {
  matches!(
    token,
    "where"
      | "group"
      | "order"
      | "limit"
      | "having"
      | "set"
      | "values"
      | "union"
      | "intersect"
      | "except"
      | "window"
      | "returning"
  )
}

/// Replace the contents of string literals with spaces so keywords
/// inside them cannot confuse the token scan.
fn blank_string_literals(sql: &str) -> String {
  let mut out = String::with_capacity(sql.len());
  let mut quote: Option<char> = None;

  for c in sql.chars() {
    match (quote, c) {
      (Some(q), _) if c == q => {
        quote = None;
        out.push(c);
      }
      (Some(_), _) => out.push(' '),
      (None, '\'' | '"') => {
        quote = Some(c);
        out.push(c);
      }
      (None, _) => out.push(c),
    }
  }
  out
}

// ─── Tests ───────────────────────────────────────────────────────────────────

//! The CSV → [`TransactionRecord`] parser.
//!
//! Pipeline:
//!   raw bytes
//!     └─ header check          → SchemaMismatch before any row is read
//!          └─ per-row coercion → ParseError naming the row and column
//!               └─ Vec<TransactionRecord>, all-or-nothing

use std::{collections::HashMap, io::Read};

use chrono::{NaiveDate, NaiveDateTime};
use fraudlens_core::record::TransactionRecord;

use crate::error::{Error, Result};

/// Columns every upload must carry, matching the source dataset.
pub const REQUIRED_COLUMNS: [&str; 13] = [
  "trans_date_trans_time",
  "amt",
  "trans_num",
  "is_fraud",
  "merchant",
  "category",
  "city",
  "state",
  "lat",
  "long",
  "city_pop",
  "job",
  "dob",
];

/// Date-of-birth pattern: `DD-MM-YYYY`.
pub const DOB_FORMAT: &str = "%d-%m-%Y";
/// Transaction-timestamp pattern: `DD-MM-YYYY HH:MM`.
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M";

/// Parse an uploaded CSV into records.
///
/// Returns [`Error::SchemaMismatch`] listing every absent required
/// column before reading any row, or [`Error::Parse`] for the first
/// field that fails coercion. Extra columns are ignored.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<TransactionRecord>> {
  let mut rdr = csv::Reader::from_reader(reader);

  let headers = rdr.headers()?.clone();
  let index: HashMap<&str, usize> = headers
    .iter()
    .enumerate()
    .map(|(i, h)| (h.trim(), i))
    .collect();

  let missing: Vec<String> = REQUIRED_COLUMNS
    .iter()
    .filter(|c| !index.contains_key(**c))
    .map(|c| c.to_string())
    .collect();
  if !missing.is_empty() {
    return Err(Error::SchemaMismatch(missing));
  }

  let mut records = Vec::new();
  for (n, result) in rdr.records().enumerate() {
    let raw = result?;
    let row = n + 1;
    let field =
      |column: &'static str| raw.get(index[column]).unwrap_or("").trim();

    records.push(TransactionRecord {
      trans_date_trans_time: parse_datetime(
        row,
        "trans_date_trans_time",
        field("trans_date_trans_time"),
      )?,
      amt:       parse_f64(row, "amt", field("amt"))?,
      trans_num: field("trans_num").to_string(),
      is_fraud:  parse_bool(row, "is_fraud", field("is_fraud"))?,
      merchant:  field("merchant").to_string(),
      category:  field("category").to_string(),
      city:      field("city").to_string(),
      state:     field("state").to_string(),
      lat:       parse_f64(row, "lat", field("lat"))?,
      long:      parse_f64(row, "long", field("long"))?,
      city_pop:  parse_i64(row, "city_pop", field("city_pop"))?,
      job:       field("job").to_string(),
      dob:       parse_date(row, "dob", field("dob"))?,
    });
  }

  Ok(records)
}

// ─── Field coercions ─────────────────────────────────────────────────────────

fn parse_date(row: usize, column: &'static str, s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DOB_FORMAT).map_err(|_| Error::Parse {
    row,
    column,
    message: format!("{s:?} does not match {DOB_FORMAT}"),
  })
}

fn parse_datetime(
  row: usize,
  column: &'static str,
  s: &str,
) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).map_err(|_| {
    Error::Parse {
      row,
      column,
      message: format!("{s:?} does not match {TIMESTAMP_FORMAT}"),
    }
  })
}

fn parse_f64(row: usize, column: &'static str, s: &str) -> Result<f64> {
  s.parse().map_err(|_| Error::Parse {
    row,
    column,
    message: format!("{s:?} is not a number"),
  })
}

fn parse_i64(row: usize, column: &'static str, s: &str) -> Result<i64> {
  s.parse().map_err(|_| Error::Parse {
    row,
    column,
    message: format!("{s:?} is not an integer"),
  })
}

/// Boolean coercion matching the source data: `0`/`1` or `true`/`false`
/// in any case.
fn parse_bool(row: usize, column: &'static str, s: &str) -> Result<bool> {
  match s {
    "0" => Ok(false),
    "1" => Ok(true),
    _ if s.eq_ignore_ascii_case("true") => Ok(true),
    _ if s.eq_ignore_ascii_case("false") => Ok(false),
    _ => Err(Error::Parse {
      row,
      column,
      message: format!("{s:?} is not a boolean"),
    }),
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

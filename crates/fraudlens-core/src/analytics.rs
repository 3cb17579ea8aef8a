//! Pure, read-only analytics over an in-memory slice of records.
//!
//! Nothing here touches the database or mutates its input; every view
//! operates on whatever filtered subset the caller hands in. In
//! particular, [`detect_anomalies`] computes its quartiles from the
//! subset it is given, not from the full dataset, so the flagged rows
//! change as the caller's filter range changes.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{Error, Result, record::TransactionRecord};

/// Numeric columns covered by [`summary_statistics`].
pub const NUMERIC_COLUMNS: [&str; 4] = ["amt", "lat", "long", "city_pop"];

// ─── Filtering ───────────────────────────────────────────────────────────────

/// Keep only the rows whose amount lies in `[min_amt, max_amt]` (inclusive).
pub fn filter_by_amount(
  rows: &[TransactionRecord],
  min_amt: f64,
  max_amt: f64,
) -> Vec<TransactionRecord> {
  rows
    .iter()
    .filter(|r| r.amt >= min_amt && r.amt <= max_amt)
    .cloned()
    .collect()
}

// ─── Summary statistics ──────────────────────────────────────────────────────

/// Descriptive statistics for one numeric column.
///
/// The optional fields are `None` when the subset is too small to define
/// them (no rows, or a single row for `std`).
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
  pub column: String,
  pub count:  usize,
  pub mean:   Option<f64>,
  pub std:    Option<f64>,
  pub min:    Option<f64>,
  pub q1:     Option<f64>,
  pub median: Option<f64>,
  pub q3:     Option<f64>,
  pub max:    Option<f64>,
}

/// Count / mean / sample std / quartile summary per numeric column.
pub fn summary_statistics(rows: &[TransactionRecord]) -> Vec<ColumnSummary> {
  NUMERIC_COLUMNS
    .iter()
    .map(|column| {
      // Unwrap is fine: NUMERIC_COLUMNS only names numeric fields.
      let values = numeric_values(rows, column).expect("known numeric column");
      summarize(column, values)
    })
    .collect()
}

/// Extract one column of a record slice as `f64`s, in row order.
/// Columns outside [`NUMERIC_COLUMNS`] are an error.
fn numeric_values(rows: &[TransactionRecord], column: &str) -> Result<Vec<f64>> {
  let field: fn(&TransactionRecord) -> f64 = match column {
    "amt" => |r| r.amt,
    "lat" => |r| r.lat,
    "long" => |r| r.long,
    "city_pop" => |r| r.city_pop as f64,
    other => return Err(Error::UnknownColumn(other.to_string())),
  };
  Ok(rows.iter().map(field).collect())
}

fn summarize(column: &str, mut values: Vec<f64>) -> ColumnSummary {
  values.sort_by(|a, b| a.partial_cmp(b).expect("non-NaN column values"));
  let count = values.len();

  let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
  let std = (count > 1).then(|| {
    let m = mean.expect("mean defined when count > 1");
    let ss = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>();
    // Sample standard deviation (ddof = 1).
    (ss / (count - 1) as f64).sqrt()
  });

  ColumnSummary {
    column: column.to_string(),
    count,
    mean,
    std,
    min:    values.first().copied(),
    q1:     quantile(&values, 0.25),
    median: quantile(&values, 0.5),
    q3:     quantile(&values, 0.75),
    max:    values.last().copied(),
  }
}

/// Quantile by linear interpolation between closest ranks.
/// `values` must be sorted ascending. Returns `None` for an empty slice.
fn quantile(values: &[f64], q: f64) -> Option<f64> {
  if values.is_empty() {
    return None;
  }
  let pos = q * (values.len() - 1) as f64;
  let lo = pos.floor() as usize;
  let hi = pos.ceil() as usize;
  let frac = pos - lo as f64;
  Some(values[lo] + (values[hi] - values[lo]) * frac)
}

// ─── Value distribution ──────────────────────────────────────────────────────

/// Frequency counts of the top `top_n` distinct values of `column`.
///
/// Ordered by descending count; ties break on the value itself so the
/// output is deterministic. Unknown columns are an error rather than an
/// empty result.
pub fn value_distribution(
  rows: &[TransactionRecord],
  column: &str,
  top_n: usize,
) -> Result<Vec<(String, usize)>> {
  let mut counts: HashMap<String, usize> = HashMap::new();
  for row in rows {
    *counts.entry(column_value(row, column)?).or_default() += 1;
  }

  let mut out: Vec<(String, usize)> = counts.into_iter().collect();
  out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
  out.truncate(top_n);
  Ok(out)
}

/// Render one column of a record as a display string, for counting.
fn column_value(row: &TransactionRecord, column: &str) -> Result<String> {
  Ok(match column {
    "merchant" => row.merchant.clone(),
    "category" => row.category.clone(),
    "city" => row.city.clone(),
    "state" => row.state.clone(),
    "job" => row.job.clone(),
    "trans_num" => row.trans_num.clone(),
    "is_fraud" => row.is_fraud.to_string(),
    "amt" => row.amt.to_string(),
    "lat" => row.lat.to_string(),
    "long" => row.long.to_string(),
    "city_pop" => row.city_pop.to_string(),
    "dob" => row.dob.to_string(),
    "trans_date_trans_time" => row.trans_date_trans_time.to_string(),
    other => return Err(Error::UnknownColumn(other.to_string())),
  })
}

// ─── Time series ─────────────────────────────────────────────────────────────

/// Transaction counts grouped by calendar date, in date order.
pub fn time_series(rows: &[TransactionRecord]) -> Vec<(NaiveDate, u64)> {
  let mut by_date: BTreeMap<NaiveDate, u64> = BTreeMap::new();
  for row in rows {
    *by_date.entry(row.trans_date_trans_time.date()).or_default() += 1;
  }
  by_date.into_iter().collect()
}

// ─── Anomaly detection ───────────────────────────────────────────────────────

/// The rows whose `amt` falls outside the IQR fence, plus the fence itself.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyReport {
  /// `Q1 − 1.5·IQR`; `None` when the subset is empty.
  pub lower: Option<f64>,
  /// `Q3 + 1.5·IQR`; `None` when the subset is empty.
  pub upper: Option<f64>,
  pub rows:  Vec<TransactionRecord>,
}

/// Flag rows with `amt` outside `[Q1 − 1.5·IQR, Q3 + 1.5·IQR]`.
///
/// The quartiles come from `rows` itself — the caller's filtered subset —
/// so narrowing the filter narrows the fence too.
pub fn detect_anomalies(rows: &[TransactionRecord]) -> AnomalyReport {
  let mut amounts: Vec<f64> = rows.iter().map(|r| r.amt).collect();
  amounts.sort_by(|a, b| a.partial_cmp(b).expect("non-NaN amounts"));

  let (Some(q1), Some(q3)) =
    (quantile(&amounts, 0.25), quantile(&amounts, 0.75))
  else {
    return AnomalyReport { lower: None, upper: None, rows: Vec::new() };
  };

  let iqr = q3 - q1;
  let lower = q1 - 1.5 * iqr;
  let upper = q3 + 1.5 * iqr;

  let flagged = rows
    .iter()
    .filter(|r| r.amt < lower || r.amt > upper)
    .cloned()
    .collect();

  AnomalyReport { lower: Some(lower), upper: Some(upper), rows: flagged }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

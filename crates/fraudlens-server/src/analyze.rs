//! Handler for `POST /api/analyze`.
//!
//! Body: the raw CSV; query string: the analysis mode and the amount
//! filter. Everything here is pure computation over the upload — the
//! database is never touched, so what this endpoint shows is the
//! uploaded data whether or not it was ever ingested.

use axum::{
  Json,
  extract::Query,
};
use fraudlens_core::analytics::{
  detect_anomalies, filter_by_amount, summary_statistics, time_series,
  value_distribution,
};
use fraudlens_csv::parse_csv;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
  Overview,
  Distribution,
  Timeseries,
  Anomalies,
}

#[derive(Debug, Deserialize)]
pub struct Params {
  pub mode:    Mode,
  /// Inclusive amount filter; unbounded when omitted.
  pub min_amt: Option<f64>,
  pub max_amt: Option<f64>,
  /// Column for `distribution` mode. Defaults to `amt`.
  pub column:  Option<String>,
  /// Number of distinct values for `distribution` mode.
  pub top_n:   Option<usize>,
}

const DEFAULT_DISTRIBUTION_COLUMN: &str = "amt";
const DEFAULT_TOP_N: usize = 20;

pub async fn handler(
  Query(params): Query<Params>,
  body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
  let records = parse_csv(body.as_bytes())
    .map_err(|e| ApiError::BadUpload(e.to_string()))?;

  let rows = filter_by_amount(
    &records,
    params.min_amt.unwrap_or(f64::NEG_INFINITY),
    params.max_amt.unwrap_or(f64::INFINITY),
  );

  let result = match params.mode {
    Mode::Overview => json!(summary_statistics(&rows)),
    Mode::Distribution => {
      let column = params
        .column
        .as_deref()
        .unwrap_or(DEFAULT_DISTRIBUTION_COLUMN);
      let counts = value_distribution(
        &rows,
        column,
        params.top_n.unwrap_or(DEFAULT_TOP_N),
      )
      .map_err(|e| ApiError::BadRequest(e.to_string()))?;
      json!(counts)
    }
    Mode::Timeseries => json!(time_series(&rows)),
    Mode::Anomalies => json!(detect_anomalies(&rows)),
  };

  Ok(Json(result))
}

//! Handler for `POST /api/ingest`.
//!
//! Body: the raw CSV. The upload is parsed in full before the store is
//! touched, so a `SchemaMismatch` or `ParseError` can never leave
//! partial rows behind.

use axum::{Json, extract::State};
use fraudlens_bridge::SqlGenerator;
use fraudlens_core::store::{IngestReport, TransactionStore};
use fraudlens_csv::parse_csv;

use crate::{AppState, error::ApiError};

pub async fn handler<S, G>(
  State(state): State<AppState<S, G>>,
  body: String,
) -> Result<Json<IngestReport>, ApiError>
where
  S: TransactionStore,
  G: SqlGenerator,
{
  let records = parse_csv(body.as_bytes())
    .map_err(|e| ApiError::BadUpload(e.to_string()))?;

  tracing::info!(rows = records.len(), "ingesting upload");
  let report = state
    .store
    .ingest(&records)
    .await
    .map_err(|e| ApiError::IngestionFailed(e.to_string()))?;

  Ok(Json(report))
}

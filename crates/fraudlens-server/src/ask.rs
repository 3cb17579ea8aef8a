//! Handler for `POST /api/ask` — the NL→SQL chatbot endpoint.
//!
//! generate → validate → execute. A completion that fails the gate is
//! never executed; a statement the database rejects comes back with the
//! database's own message so the user can rephrase.

use axum::{Json, extract::State};
use fraudlens_bridge::{SqlGenerator, validate};
use fraudlens_core::store::TransactionStore;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct AskBody {
  pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
  /// The statement that was actually executed.
  pub sql:     String,
  pub columns: Vec<String>,
  pub rows:    Vec<Vec<serde_json::Value>>,
}

pub async fn handler<S, G>(
  State(state): State<AppState<S, G>>,
  Json(body): Json<AskBody>,
) -> Result<Json<AskResponse>, ApiError>
where
  S: TransactionStore,
  G: SqlGenerator,
{
  let candidate = state.generator.generate_sql(&body.question).await?;
  let sql = validate(&candidate, state.policy)?;

  tracing::info!(sql = %sql.as_str(), "executing generated statement");
  let table = state
    .store
    .query(sql.as_str())
    .await
    .map_err(|e| ApiError::SqlExecution(e.to_string()))?;

  Ok(Json(AskResponse {
    sql:     sql.as_str().to_string(),
    columns: table.columns,
    rows:    table.rows,
  }))
}

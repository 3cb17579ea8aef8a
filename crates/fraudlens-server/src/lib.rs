//! JSON API server for the fraudlens dashboard.
//!
//! Exposes an axum [`Router`] over any
//! [`TransactionStore`](fraudlens_core::store::TransactionStore) and
//! [`SqlGenerator`](fraudlens_bridge::SqlGenerator):
//!
//!   - `POST /api/ingest`  — parse an uploaded CSV and load it into the
//!     normalised schema;
//!   - `POST /api/analyze` — pure exploratory statistics over an upload;
//!   - `POST /api/ask`     — the NL→SQL chatbot.
//!
//! All failures come back as inline JSON messages; the session never
//! terminates on a bad upload or a bad question.

pub mod analyze;
pub mod ask;
pub mod error;
pub mod ingest;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::post};
use fraudlens_bridge::{GatePolicy, SqlGenerator};
use fraudlens_core::store::TransactionStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` layered under
/// the `FRAUDLENS_*` environment. Built once at startup and passed in —
/// no ambient globals.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:         String,
  #[serde(default = "default_port")]
  pub port:         u16,
  #[serde(default = "default_store_path")]
  pub store_path:   PathBuf,
  #[serde(default = "default_llm_base_url")]
  pub llm_base_url: String,
  /// Falls back to the `OPENAI_API_KEY` environment variable when unset.
  #[serde(default)]
  pub llm_api_key:  Option<String>,
  #[serde(default = "default_llm_model")]
  pub llm_model:    String,
  /// Permit the chatbot to execute INSERT/UPDATE/DELETE. Off by default.
  #[serde(default)]
  pub allow_writes: bool,
}

fn default_host() -> String {
  "127.0.0.1".to_string()
}
fn default_port() -> u16 {
  8080
}
fn default_store_path() -> PathBuf {
  PathBuf::from("fraudlens.db")
}
fn default_llm_base_url() -> String {
  "https://api.openai.com".to_string()
}
fn default_llm_model() -> String {
  "gpt-4".to_string()
}

impl ServerConfig {
  pub fn policy(&self) -> GatePolicy {
    if self.allow_writes {
      GatePolicy::AllowWrites
    } else {
      GatePolicy::ReadOnly
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, G> {
  pub store:     Arc<S>,
  pub generator: Arc<G>,
  pub policy:    GatePolicy,
}

// Manual impl: `Arc` clones regardless of whether S and G do.
impl<S, G> Clone for AppState<S, G> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      generator: Arc::clone(&self.generator),
      policy:    self.policy,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the dashboard API.
pub fn router<S, G>(state: AppState<S, G>) -> Router
where
  S: TransactionStore + 'static,
  G: SqlGenerator + 'static,
{
  Router::new()
    .route("/api/ingest", post(ingest::handler::<S, G>))
    .route("/api/analyze", post(analyze::handler))
    .route("/api/ask", post(ask::handler::<S, G>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
  };
  use fraudlens_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  /// Canned generator: always replies with the same completion.
  struct StubGenerator {
    reply: String,
  }

  impl SqlGenerator for StubGenerator {
    async fn generate_sql(
      &self,
      _question: &str,
    ) -> fraudlens_bridge::Result<String> {
      Ok(self.reply.clone())
    }
  }

  const SAMPLE_CSV: &str = "\
trans_date_trans_time,amt,trans_num,is_fraud,merchant,category,city,state,lat,long,city_pop,job,dob
15-03-2022 10:05,10.00,tx-1,0,acme,grocery_pos,Wales,AK,64.75,-165.67,145,Therapist,02-04-1988
16-03-2022 11:30,20.00,tx-2,0,acme,grocery_pos,Wales,AK,64.75,-165.67,145,Therapist,02-04-1988
17-03-2022 09:15,30.00,tx-3,1,zenith,travel,Nome,AK,64.50,-165.40,3866,Pilot,19-11-1975";

  async fn make_state(reply: &str) -> AppState<SqliteStore, StubGenerator> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState {
      store:     Arc::new(store),
      generator: Arc::new(StubGenerator { reply: reply.to_string() }),
      policy:    GatePolicy::ReadOnly,
    }
  }

  async fn post_csv(
    state: AppState<SqliteStore, StubGenerator>,
    uri: &str,
    csv: &str,
  ) -> axum::response::Response {
    let req = Request::builder()
      .method("POST")
      .uri(uri)
      .header(header::CONTENT_TYPE, "text/csv")
      .body(Body::from(csv.to_string()))
      .unwrap();
    router(state).oneshot(req).await.unwrap()
  }

  async fn post_question(
    state: AppState<SqliteStore, StubGenerator>,
    question: &str,
  ) -> axum::response::Response {
    let req = Request::builder()
      .method("POST")
      .uri("/api/ask")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json!({ "question": question }).to_string()))
      .unwrap();
    router(state).oneshot(req).await.unwrap()
  }

  async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  // ── Ingest ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn ingest_reports_deduplicated_counts() {
    let state = make_state("").await;
    let resp = post_csv(state, "/api/ingest", SAMPLE_CSV).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let report = body_json(resp).await;
    assert_eq!(report["outcome"], "loaded");
    assert_eq!(report["merchants"], 2);
    assert_eq!(report["locations"], 2);
    assert_eq!(report["users"], 2);
    assert_eq!(report["transactions"], 3);
  }

  #[tokio::test]
  async fn ingest_missing_column_is_400() {
    let state = make_state("").await;
    // The `dob` column is absent entirely.
    let csv = "\
trans_date_trans_time,amt,trans_num,is_fraud,merchant,category,city,state,lat,long,city_pop,job
15-03-2022 10:05,10.00,tx-1,0,acme,grocery_pos,Wales,AK,64.75,-165.67,145,Therapist";
    let resp = post_csv(state, "/api/ingest", csv).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = body_json(resp).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("dob"), "message: {message}");
  }

  #[tokio::test]
  async fn reingesting_the_same_upload_inserts_nothing() {
    let state = make_state("").await;
    post_csv(state.clone(), "/api/ingest", SAMPLE_CSV).await;
    let resp = post_csv(state, "/api/ingest", SAMPLE_CSV).await;

    let report = body_json(resp).await;
    assert_eq!(report["merchants"], 0);
    assert_eq!(report["transactions"], 0);
  }

  // ── Analyze ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn analyze_overview_summarises_numeric_columns() {
    let state = make_state("").await;
    let resp = post_csv(state, "/api/analyze?mode=overview", SAMPLE_CSV).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let summaries = body_json(resp).await;
    assert_eq!(summaries.as_array().unwrap().len(), 4);
    let amt = summaries
      .as_array()
      .unwrap()
      .iter()
      .find(|c| c["column"] == "amt")
      .unwrap();
    assert_eq!(amt["count"], 3);
    assert_eq!(amt["mean"], 20.0);
  }

  #[tokio::test]
  async fn analyze_amount_filter_narrows_the_subset() {
    let state = make_state("").await;
    let resp = post_csv(
      state,
      "/api/analyze?mode=overview&min_amt=15",
      SAMPLE_CSV,
    )
    .await;

    let summaries = body_json(resp).await;
    let amt = summaries
      .as_array()
      .unwrap()
      .iter()
      .find(|c| c["column"] == "amt")
      .unwrap();
    assert_eq!(amt["count"], 2);
  }

  #[tokio::test]
  async fn analyze_distribution_counts_values() {
    let state = make_state("").await;
    let resp = post_csv(
      state,
      "/api/analyze?mode=distribution&column=merchant&top_n=1",
      SAMPLE_CSV,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let counts = body_json(resp).await;
    assert_eq!(counts, json!([["acme", 2]]));
  }

  #[tokio::test]
  async fn analyze_unknown_column_is_400() {
    let state = make_state("").await;
    let resp = post_csv(
      state,
      "/api/analyze?mode=distribution&column=card_number",
      SAMPLE_CSV,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn analyze_anomalies_returns_fence_and_rows() {
    let state = make_state("").await;
    let resp =
      post_csv(state, "/api/analyze?mode=anomalies", SAMPLE_CSV).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let report = body_json(resp).await;
    assert!(report["lower"].is_number());
    assert!(report["upper"].is_number());
    assert!(report["rows"].is_array());
  }

  // ── Ask ─────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn ask_executes_the_worked_example() {
    let state =
      make_state("SELECT COUNT(*) FROM fraud_data WHERE is_fraud = TRUE;")
        .await;
    post_csv(state.clone(), "/api/ingest", SAMPLE_CSV).await;

    let resp =
      post_question(state, "Count the number of fraud transactions").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(
      body["sql"],
      "SELECT COUNT(*) FROM fraud_data WHERE is_fraud = TRUE;"
    );
    assert_eq!(body["columns"].as_array().unwrap().len(), 1);
    assert_eq!(body["rows"], json!([[1]]));
  }

  #[tokio::test]
  async fn ask_rejects_prose_completions() {
    let state =
      make_state("I cannot answer that from the available tables.").await;
    let resp = post_question(state, "What is the meaning of life?").await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  }

  #[tokio::test]
  async fn ask_rejects_writes_under_the_default_policy() {
    let state = make_state("DELETE FROM fraud_data;").await;
    post_csv(state.clone(), "/api/ingest", SAMPLE_CSV).await;

    let resp = post_question(state.clone(), "Delete everything").await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // The statement never reached the database.
    let table = state.store.query("SELECT COUNT(*) FROM fraud_data").await.unwrap();
    assert_eq!(table.rows[0][0], json!(3));
  }

  #[tokio::test]
  async fn ask_surfaces_database_rejections() {
    let state = make_state("SELECT no_such_column FROM fraud_data").await;
    post_csv(state.clone(), "/api/ingest", SAMPLE_CSV).await;

    let resp = post_question(state, "Show me the nonsense column").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = body_json(resp).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("no_such_column"), "message: {message}");
  }
}

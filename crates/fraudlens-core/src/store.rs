//! The `TransactionStore` trait and supporting result types.
//!
//! The trait is implemented by storage backends (e.g.
//! `fraudlens-store-sqlite`). Higher layers (`fraudlens-server`) depend
//! on this abstraction, not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::record::TransactionRecord;

// ─── Ingestion results ───────────────────────────────────────────────────────

/// How an ingestion batch ultimately landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestOutcome {
  /// Committed on the first attempt.
  Loaded,
  /// The first attempt hit a database error; the single retry committed.
  RecoveredAfterRetry,
}

/// Row counts actually inserted by one ingestion batch.
///
/// Conflict-skipped rows — dimension values already present from an
/// earlier upload, or an already-seen `trans_num` — are not counted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
  pub outcome:      IngestOutcome,
  pub merchants:    usize,
  pub locations:    usize,
  pub users:        usize,
  pub transactions: usize,
}

// ─── Query results ───────────────────────────────────────────────────────────

/// A fetched result set paired with its column names, ready for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryTable {
  pub columns: Vec<String>,
  pub rows:    Vec<Vec<serde_json::Value>>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the relational backend holding the normalised schema.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait TransactionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Idempotently create the four tables (merchants, locations, users,
  /// fraud_data) if absent. Safe to call on every start; a failure is
  /// fatal to subsequent ingestion and must be surfaced.
  fn ensure_schema(
    &self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Ingest a parsed batch: upsert the deduplicated dimension rows,
  /// resolve their surrogate keys, then insert one fact row per record.
  ///
  /// The batch is atomic — either every row of the upload lands or none
  /// does. On a database error the whole batch is retried exactly once;
  /// a second failure is reported to the caller with its cause.
  fn ingest<'a>(
    &'a self,
    records: &'a [TransactionRecord],
  ) -> impl Future<Output = Result<IngestReport, Self::Error>> + Send + 'a;

  /// Execute an already-validated SQL statement and fetch all rows.
  ///
  /// Used by the NL-to-SQL bridge; validation is the bridge's job, the
  /// store runs what it is given and surfaces database rejections
  /// verbatim.
  fn query<'a>(
    &'a self,
    sql: &'a str,
  ) -> impl Future<Output = Result<QueryTable, Self::Error>> + Send + 'a;
}

//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use fraudlens_core::{
  record::TransactionRecord,
  store::{IngestOutcome, TransactionStore},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn record(
  trans_num: &str,
  merchant: &str,
  category: &str,
  amt: f64,
  is_fraud: bool,
) -> TransactionRecord {
  TransactionRecord {
    trans_date_trans_time: NaiveDate::from_ymd_opt(2022, 3, 15)
      .unwrap()
      .and_hms_opt(10, 5, 0)
      .unwrap(),
    amt,
    trans_num: trans_num.to_string(),
    is_fraud,
    merchant: merchant.to_string(),
    category: category.to_string(),
    city: "Wales".to_string(),
    state: "AK".to_string(),
    lat: 64.7556,
    long: -165.6723,
    city_pop: 145,
    job: "Therapist".to_string(),
    dob: NaiveDate::from_ymd_opt(1988, 4, 2).unwrap(),
  }
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_schema_is_idempotent() {
  let s = store().await;
  // The schema already ran on open; running it again must be a no-op.
  s.ensure_schema().await.unwrap();
  s.ensure_schema().await.unwrap();
}

// ─── Ingestion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn shared_dimension_values_resolve_to_one_row() {
  let s = store().await;

  // Two of the three rows share a merchant/category pair.
  let batch = vec![
    record("tx-1", "acme", "grocery_pos", 10.0, false),
    record("tx-2", "acme", "grocery_pos", 20.0, false),
    record("tx-3", "zenith", "travel", 30.0, true),
  ];
  let report = s.ingest(&batch).await.unwrap();

  assert_eq!(report.outcome, IngestOutcome::Loaded);
  assert_eq!(report.merchants, 2);
  assert_eq!(report.locations, 1);
  assert_eq!(report.users, 1);
  assert_eq!(report.transactions, 3);

  // Every fact row points at the right merchant through its foreign key.
  let table = s
    .query(
      "SELECT f.trans_num, m.merchant_name
       FROM fraud_data f
       JOIN merchants m ON m.merchant_id = f.merchant_id
       ORDER BY f.trans_num",
    )
    .await
    .unwrap();

  assert_eq!(table.columns, vec!["trans_num", "merchant_name"]);
  assert_eq!(
    table.rows,
    vec![
      vec![serde_json::json!("tx-1"), serde_json::json!("acme")],
      vec![serde_json::json!("tx-2"), serde_json::json!("acme")],
      vec![serde_json::json!("tx-3"), serde_json::json!("zenith")],
    ]
  );
}

#[tokio::test]
async fn reingesting_an_identical_batch_inserts_nothing() {
  let s = store().await;
  let batch = vec![
    record("tx-1", "acme", "grocery_pos", 10.0, false),
    record("tx-2", "zenith", "travel", 20.0, true),
  ];

  s.ingest(&batch).await.unwrap();
  let second = s.ingest(&batch).await.unwrap();

  assert_eq!(second.merchants, 0);
  assert_eq!(second.locations, 0);
  assert_eq!(second.users, 0);
  assert_eq!(second.transactions, 0);

  let table = s.query("SELECT COUNT(*) FROM fraud_data").await.unwrap();
  assert_eq!(table.rows[0][0], serde_json::json!(2));
}

#[tokio::test]
async fn known_dimension_rows_are_skipped_across_batches() {
  let s = store().await;

  s.ingest(&[record("tx-1", "acme", "grocery_pos", 10.0, false)])
    .await
    .unwrap();
  // Same merchant, location, and card holder; new transaction.
  let report = s
    .ingest(&[record("tx-2", "acme", "grocery_pos", 99.0, false)])
    .await
    .unwrap();

  assert_eq!(report.merchants, 0);
  assert_eq!(report.users, 0);
  assert_eq!(report.transactions, 1);

  let table = s.query("SELECT COUNT(*) FROM merchants").await.unwrap();
  assert_eq!(table.rows[0][0], serde_json::json!(1));
}

// ─── Retry semantics ─────────────────────────────────────────────────────────

#[tokio::test]
async fn ingest_recovers_after_one_retry() {
  // File-backed, so the retry reopens the connection and re-runs the
  // schema batch, repairing the table dropped below.
  let path = std::env::temp_dir()
    .join(format!("fraudlens-retry-{}.db", std::process::id()));
  let _ = std::fs::remove_file(&path);

  let s = SqliteStore::open(&path).await.unwrap();
  // Break the schema out from under the next batch. `query` executes
  // whatever it is given, so it doubles as the sabotage vehicle here.
  s.query("DROP TABLE fraud_data").await.unwrap();

  let report = s
    .ingest(&[record("tx-1", "acme", "grocery_pos", 10.0, false)])
    .await
    .unwrap();

  assert_eq!(report.outcome, IngestOutcome::RecoveredAfterRetry);
  assert_eq!(report.transactions, 1);
  // The failed first attempt rolled back; the dimensions landed once.
  assert_eq!(report.merchants, 1);

  let table = s.query("SELECT COUNT(*) FROM fraud_data").await.unwrap();
  assert_eq!(table.rows[0][0], serde_json::json!(1));

  for suffix in ["", "-wal", "-shm"] {
    let mut name = path.clone().into_os_string();
    name.push(suffix);
    let _ = std::fs::remove_file(name);
  }
}

#[tokio::test]
async fn ingest_reports_failure_after_second_attempt() {
  // In-memory stores retry on the same handle, so a dropped table stays
  // dropped and both attempts fail.
  let s = store().await;
  s.query("DROP TABLE fraud_data").await.unwrap();

  let err = s
    .ingest(&[record("tx-1", "acme", "grocery_pos", 10.0, false)])
    .await
    .unwrap_err();
  assert!(matches!(err, Error::IngestionFailed(_)), "got {err:?}");
}

// ─── Queries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fraud_count_query_returns_one_row_one_column() {
  let s = store().await;
  s.ingest(&[
    record("tx-1", "acme", "grocery_pos", 10.0, false),
    record("tx-2", "acme", "grocery_pos", 20.0, true),
    record("tx-3", "zenith", "travel", 30.0, true),
  ])
  .await
  .unwrap();

  let table = s
    .query("SELECT COUNT(*) FROM fraud_data WHERE is_fraud = TRUE;")
    .await
    .unwrap();

  assert_eq!(table.columns.len(), 1);
  assert_eq!(table.rows.len(), 1);
  assert_eq!(table.rows[0][0], serde_json::json!(2));
}

#[tokio::test]
async fn rejected_statement_surfaces_as_sql_error() {
  let s = store().await;
  let err = s
    .query("SELECT no_such_column FROM fraud_data")
    .await
    .unwrap_err();
  match err {
    Error::Sql(message) => {
      assert!(message.contains("no_such_column"), "message: {message}")
    }
    other => panic!("expected Sql, got {other:?}"),
  }
}

#[tokio::test]
async fn timestamps_are_stored_queryably() {
  let s = store().await;
  s.ingest(&[record("tx-1", "acme", "grocery_pos", 10.0, false)])
    .await
    .unwrap();

  // ISO 8601 text storage means SQLite's date functions work directly.
  let table = s
    .query("SELECT strftime('%Y', trans_date_trans_time) FROM fraud_data")
    .await
    .unwrap();
  assert_eq!(table.rows[0][0], serde_json::json!("2022"));
}

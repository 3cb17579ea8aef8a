//! [`SqliteStore`] — the SQLite implementation of [`TransactionStore`].

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
};

use fraudlens_core::{
  record::TransactionRecord,
  store::{IngestOutcome, IngestReport, QueryTable, TransactionStore},
};
use rusqlite::Transaction;
use tokio::sync::RwLock;

use crate::{
  Error, Result,
  encode::{encode_date, encode_ts, value_to_json},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A fraudlens store backed by a single SQLite file.
///
/// The connection handle sits behind an `RwLock` so the ingestion retry
/// can swap in a fresh connection; every operation clones the cheap,
/// reference-counted handle out of the lock first.
pub struct SqliteStore {
  conn: RwLock<tokio_rusqlite::Connection>,
  path: Option<PathBuf>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    let store = Self {
      conn: RwLock::new(conn),
      path: Some(path.as_ref().to_path_buf()),
    };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn: RwLock::new(conn), path: None };
    store.init_schema().await?;
    Ok(store)
  }

  async fn handle(&self) -> tokio_rusqlite::Connection {
    self.conn.read().await.clone()
  }

  async fn init_schema(&self) -> Result<()> {
    let conn = self.handle().await;
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Replace the connection with a freshly opened one.
  ///
  /// Only meaningful for file-backed stores; reopening an in-memory
  /// database would discard it, so those retry on the same handle.
  async fn reconnect(&self) -> Result<()> {
    let Some(path) = &self.path else { return Ok(()) };
    let fresh = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(|e| Error::Connection(e.to_string()))?;
    fresh
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(|e| Error::Connection(e.to_string()))?;
    *self.conn.write().await = fresh;
    Ok(())
  }

  /// Run one ingestion batch inside a single transaction.
  async fn ingest_batch(
    &self,
    records: Vec<TransactionRecord>,
  ) -> Result<BatchCounts> {
    let conn = self.handle().await;
    let counts = conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let counts = insert_batch(&tx, &records)?;
        tx.commit()?;
        Ok(counts)
      })
      .await?;
    Ok(counts)
  }
}

// ─── Batch insertion ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
struct BatchCounts {
  merchants:    usize,
  locations:    usize,
  users:        usize,
  transactions: usize,
}

/// Location natural key with floats keyed by bit pattern. The bits come
/// from a single parse of the same CSV text, so NaN and negative-zero
/// variants of equal coordinates do not arise.
type LocationKey = (String, String, u64, u64, i64);

fn insert_batch(
  tx: &Transaction<'_>,
  records: &[TransactionRecord],
) -> rusqlite::Result<BatchCounts> {
  let mut counts = BatchCounts::default();

  // Dimension value-tuple → surrogate key, deduplicating as we go.
  let mut merchant_ids: HashMap<(String, String), i64> = HashMap::new();
  let mut location_ids: HashMap<LocationKey, i64> = HashMap::new();
  let mut user_ids: HashMap<(String, String), i64> = HashMap::new();

  for r in records {
    let merchant_key = (r.merchant.clone(), r.category.clone());
    let merchant_id = match merchant_ids.get(&merchant_key) {
      Some(id) => *id,
      None => {
        counts.merchants += tx.execute(
          "INSERT INTO merchants (merchant_name, category) VALUES (?1, ?2)
           ON CONFLICT DO NOTHING",
          rusqlite::params![r.merchant, r.category],
        )?;
        let id = tx.query_row(
          "SELECT merchant_id FROM merchants
           WHERE merchant_name = ?1 AND category = ?2",
          rusqlite::params![r.merchant, r.category],
          |row| row.get(0),
        )?;
        merchant_ids.insert(merchant_key, id);
        id
      }
    };

    let location_key = (
      r.city.clone(),
      r.state.clone(),
      r.lat.to_bits(),
      r.long.to_bits(),
      r.city_pop,
    );
    let location_id = match location_ids.get(&location_key) {
      Some(id) => *id,
      None => {
        counts.locations += tx.execute(
          "INSERT INTO locations (city, state, lat, long, city_pop)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT DO NOTHING",
          rusqlite::params![r.city, r.state, r.lat, r.long, r.city_pop],
        )?;
        let id = tx.query_row(
          "SELECT location_id FROM locations
           WHERE city = ?1 AND state = ?2 AND lat = ?3 AND long = ?4
             AND city_pop = ?5",
          rusqlite::params![r.city, r.state, r.lat, r.long, r.city_pop],
          |row| row.get(0),
        )?;
        location_ids.insert(location_key, id);
        id
      }
    };

    let dob = encode_date(r.dob);
    let user_key = (r.job.clone(), dob.clone());
    let user_id = match user_ids.get(&user_key) {
      Some(id) => *id,
      None => {
        counts.users += tx.execute(
          "INSERT INTO users (job, dob) VALUES (?1, ?2)
           ON CONFLICT DO NOTHING",
          rusqlite::params![r.job, dob],
        )?;
        let id = tx.query_row(
          "SELECT user_id FROM users WHERE job = ?1 AND dob = ?2",
          rusqlite::params![r.job, dob],
          |row| row.get(0),
        )?;
        user_ids.insert(user_key, id);
        id
      }
    };

    counts.transactions += tx.execute(
      "INSERT INTO fraud_data
         (trans_date_trans_time, amt, trans_num, is_fraud,
          merchant_id, location_id, user_id)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
       ON CONFLICT (trans_num) DO NOTHING",
      rusqlite::params![
        encode_ts(r.trans_date_trans_time),
        r.amt,
        r.trans_num,
        r.is_fraud,
        merchant_id,
        location_id,
        user_id,
      ],
    )?;
  }

  Ok(counts)
}

// ─── TransactionStore impl ───────────────────────────────────────────────────

impl TransactionStore for SqliteStore {
  type Error = Error;

  async fn ensure_schema(&self) -> Result<()> {
    self.init_schema().await
  }

  async fn ingest(&self, records: &[TransactionRecord]) -> Result<IngestReport> {
    match self.ingest_batch(records.to_vec()).await {
      Ok(counts) => Ok(counts.into_report(IngestOutcome::Loaded)),
      Err(first) => {
        tracing::warn!(error = %first, "ingestion batch failed; retrying once");
        self.reconnect().await?;
        match self.ingest_batch(records.to_vec()).await {
          Ok(counts) => {
            Ok(counts.into_report(IngestOutcome::RecoveredAfterRetry))
          }
          Err(second) => Err(Error::IngestionFailed(Box::new(second))),
        }
      }
    }
  }

  async fn query(&self, sql: &str) -> Result<QueryTable> {
    let sql = sql.to_owned();
    let conn = self.handle().await;
    conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let columns: Vec<String> =
          stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();

        let mut out = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
          let mut fields = Vec::with_capacity(width);
          for i in 0..width {
            fields.push(value_to_json(row.get_ref(i)?));
          }
          out.push(fields);
        }
        Ok(QueryTable { columns, rows: out })
      })
      .await
      .map_err(|e| match e {
        // Statement-level rejections go back to the user verbatim.
        tokio_rusqlite::Error::Rusqlite(inner) => Error::Sql(inner.to_string()),
        other => Error::Database(other),
      })
  }
}

impl BatchCounts {
  fn into_report(self, outcome: IngestOutcome) -> IngestReport {
    IngestReport {
      outcome,
      merchants:    self.merchants,
      locations:    self.locations,
      users:        self.users,
      transactions: self.transactions,
    }
  }
}

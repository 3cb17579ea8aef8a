//! Transaction records — the in-memory form of one uploaded CSV row.
//!
//! A record carries both the fact attributes (timestamp, amount, fraud
//! flag) and the dimension attributes (merchant, location, card holder)
//! exactly as they appeared in the upload. Normalisation into dimension
//! and fact tables happens at ingestion time, in the storage backend.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One fully-coerced credit-card transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
  /// When the transaction happened (minute resolution in the source data).
  pub trans_date_trans_time: NaiveDateTime,
  /// Transaction amount.
  pub amt:       f64,
  /// The source system's transaction identifier; unique per transaction.
  pub trans_num: String,
  pub is_fraud:  bool,
  // Merchant dimension.
  pub merchant:  String,
  pub category:  String,
  // Location dimension.
  pub city:      String,
  pub state:     String,
  pub lat:       f64,
  pub long:      f64,
  pub city_pop:  i64,
  // Card-holder dimension. (job, dob) is the only identity the source
  // data offers; see DESIGN.md for the consequences.
  pub job:       String,
  pub dob:       NaiveDate,
}

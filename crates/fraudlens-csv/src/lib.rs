//! CSV upload parsing for fraudlens.
//!
//! Turns an uploaded transaction CSV into fully-coerced
//! [`TransactionRecord`](fraudlens_core::record::TransactionRecord)s.
//! Header validation happens before any row is read, and any coercion
//! failure aborts the whole parse — nothing half-typed ever reaches the
//! ingestion pipeline.

pub mod error;
mod parse;

pub use error::{Error, Result};
pub use parse::{DOB_FORMAT, REQUIRED_COLUMNS, TIMESTAMP_FORMAT, parse_csv};

//! Error type for `fraudlens-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// Reopening the connection for the ingestion retry failed.
  #[error("could not reconnect to the database: {0}")]
  Connection(String),

  /// The ingestion batch failed twice; the transaction boundary means no
  /// partial rows from the failed batch are visible.
  #[error("ingestion failed after retry: {0}")]
  IngestionFailed(#[source] Box<Error>),

  /// The database rejected a bridge-generated statement. The message is
  /// surfaced verbatim so the user can rephrase their question.
  #[error("sql execution failed: {0}")]
  Sql(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! Error types for the NL→SQL bridge.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The completion request itself failed (network, timeout, TLS).
  #[error("completion request failed: {0}")]
  Http(#[from] reqwest::Error),

  /// The completion service answered, but not with a usable completion
  /// (non-success status, empty choices, malformed body).
  #[error("completion service error: {0}")]
  Completion(String),

  /// The model's reply does not even look like a SQL statement. It must
  /// never reach the database.
  #[error("the generated text does not look like a SQL statement: {0:?}")]
  NotASqlStatement(String),

  /// The reply looks like SQL but failed the gate (write under a
  /// read-only policy, multiple statements, unknown table).
  #[error("generated statement rejected: {0}")]
  Rejected(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! NL→SQL bridge for fraudlens.
//!
//! Turns a free-text question into a SQL statement via an
//! OpenAI-compatible chat-completions service, then runs the result
//! through a validation gate before anyone is allowed to execute it.
//! The generation seam is the [`SqlGenerator`] trait so servers and
//! tests can swap the external service out.

mod client;
mod gate;
mod prompt;

pub mod error;

pub use client::{LlmConfig, OpenAiClient, SqlGenerator};
pub use error::{Error, Result};
pub use gate::{GatePolicy, KNOWN_TABLES, ValidatedSql, validate};
pub use prompt::SYSTEM_PROMPT;

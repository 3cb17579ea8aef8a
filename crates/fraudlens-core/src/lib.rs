//! Core types and trait definitions for the fraudlens dashboard.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod analytics;
pub mod error;
pub mod record;
pub mod store;

pub use error::{Error, Result};

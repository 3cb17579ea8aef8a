//! SQL schema for the fraudlens SQLite store.
//!
//! Executed on every open; idempotent thanks to `CREATE TABLE IF NOT
//! EXISTS`. Each dimension declares its natural key as UNIQUE so that
//! `ON CONFLICT DO NOTHING` is well-defined, and the fact table is
//! unique on the source system's transaction id so re-ingesting the
//! same upload is a no-op.

/// Full schema DDL.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS merchants (
    merchant_id   INTEGER PRIMARY KEY,
    merchant_name TEXT NOT NULL,
    category      TEXT NOT NULL,
    UNIQUE (merchant_name, category)
);

CREATE TABLE IF NOT EXISTS locations (
    location_id INTEGER PRIMARY KEY,
    city        TEXT NOT NULL,
    state       TEXT NOT NULL,
    lat         REAL NOT NULL,
    long        REAL NOT NULL,
    city_pop    INTEGER NOT NULL,
    UNIQUE (city, state, lat, long, city_pop)
);

CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY,
    job     TEXT NOT NULL,
    dob     TEXT NOT NULL,       -- ISO 8601 date
    UNIQUE (job, dob)
);

CREATE TABLE IF NOT EXISTS fraud_data (
    transaction_id        INTEGER PRIMARY KEY,
    trans_date_trans_time TEXT NOT NULL,   -- ISO 8601, minute resolution
    amt                   REAL NOT NULL,
    trans_num             TEXT NOT NULL UNIQUE,
    is_fraud              INTEGER NOT NULL,
    merchant_id           INTEGER NOT NULL REFERENCES merchants(merchant_id),
    location_id           INTEGER NOT NULL REFERENCES locations(location_id),
    user_id               INTEGER NOT NULL REFERENCES users(user_id)
);

CREATE INDEX IF NOT EXISTS fraud_data_merchant_idx ON fraud_data(merchant_id);
CREATE INDEX IF NOT EXISTS fraud_data_location_idx ON fraud_data(location_id);
CREATE INDEX IF NOT EXISTS fraud_data_user_idx     ON fraud_data(user_id);
CREATE INDEX IF NOT EXISTS fraud_data_time_idx     ON fraud_data(trans_date_trans_time);

PRAGMA user_version = 1;
";

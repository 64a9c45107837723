//! SQL schema for the recoup SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// The uniqueness invariants (agency/client reference numbers, consumer
/// SSN) are schema-level so they hold even against writers that bypass the
/// get-or-create operations. Deleting an agency cascades to its clients
/// and, through them, their accounts.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS agencies (
    agency_id    INTEGER PRIMARY KEY,
    name         TEXT NOT NULL,
    reference_no TEXT NOT NULL UNIQUE,
    created_at   TEXT NOT NULL    -- ISO 8601 UTC; store-assigned
);

CREATE TABLE IF NOT EXISTS clients (
    client_id    INTEGER PRIMARY KEY,
    agency_id    INTEGER NOT NULL REFERENCES agencies(agency_id) ON DELETE CASCADE,
    name         TEXT NOT NULL DEFAULT '',
    reference_no TEXT NOT NULL UNIQUE,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS consumers (
    consumer_id  INTEGER PRIMARY KEY,
    name         TEXT NOT NULL,
    address      TEXT NOT NULL,
    ssn          TEXT NOT NULL UNIQUE,
    created_at   TEXT NOT NULL
);

-- Accounts have no natural key; re-ingesting a file duplicates them.
CREATE TABLE IF NOT EXISTS accounts (
    account_id    INTEGER PRIMARY KEY,
    client_id     INTEGER NOT NULL REFERENCES clients(client_id)     ON DELETE CASCADE,
    consumer_id   INTEGER NOT NULL REFERENCES consumers(consumer_id) ON DELETE CASCADE,
    balance_cents INTEGER NOT NULL,  -- exact decimal, 2 fractional digits
    status        TEXT NOT NULL CHECK (status IN ('IN_COLLECTION', 'PAID_IN_FULL', 'INACTIVE')),
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS clients_agency_idx    ON clients(agency_id);
CREATE INDEX IF NOT EXISTS accounts_client_idx   ON accounts(client_id);
CREATE INDEX IF NOT EXISTS accounts_consumer_idx ON accounts(consumer_id);
CREATE INDEX IF NOT EXISTS accounts_balance_idx  ON accounts(balance_cents);
CREATE INDEX IF NOT EXISTS accounts_status_idx   ON accounts(status);

PRAGMA user_version = 1;
";

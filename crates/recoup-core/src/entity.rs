//! The four persisted record types: agency, client, consumer, account.
//!
//! Rows are created by the ingestion reconciler (or direct store calls),
//! never updated afterwards, and deleted only by cascade from an ancestor.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Collection status of an account. The serialised literals
/// (`IN_COLLECTION`, `PAID_IN_FULL`, `INACTIVE`) are the only values that
/// ever reach the store; anything else is a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
  InCollection,
  PaidInFull,
  Inactive,
}

impl AccountStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      AccountStatus::InCollection => "IN_COLLECTION",
      AccountStatus::PaidInFull => "PAID_IN_FULL",
      AccountStatus::Inactive => "INACTIVE",
    }
  }
}

#[derive(Debug, Error)]
#[error("unknown account status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for AccountStatus {
  type Err = UnknownStatus;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "IN_COLLECTION" => Ok(AccountStatus::InCollection),
      "PAID_IN_FULL" => Ok(AccountStatus::PaidInFull),
      "INACTIVE" => Ok(AccountStatus::Inactive),
      other => Err(UnknownStatus(other.to_owned())),
    }
  }
}

// ─── Balance ─────────────────────────────────────────────────────────────────

/// Parse a balance string into an exact decimal with scale 2.
///
/// Returns `None` if the string is not a decimal or carries more than two
/// significant fractional digits. Trailing zeros beyond scale 2 (e.g.
/// `"100.000"`) are accepted and normalised.
pub fn parse_balance(s: &str) -> Option<Decimal> {
  let mut d = Decimal::from_str(s).ok()?.normalize();
  if d.scale() > 2 {
    return None;
  }
  d.rescale(2);
  Some(d)
}

// ─── Entities ────────────────────────────────────────────────────────────────

/// The collection agency operating the system.
/// `reference_no` is unique across all time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agency {
  pub agency_id:    i64,
  pub name:         String,
  pub reference_no: String,
  pub created_at:   DateTime<Utc>,
}

/// An organisation that hired the agency to collect a debt. Belongs to
/// exactly one agency; `reference_no` is unique across all time.
///
/// `name` is empty for clients created through the HTTP upload path, which
/// never supplies one (see [`crate::reconcile::ClientNaming`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
  pub client_id:    i64,
  pub agency_id:    i64,
  pub name:         String,
  pub reference_no: String,
  pub created_at:   DateTime<Utc>,
}

/// The individual debtor, identified by a unique SSN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consumer {
  pub consumer_id: i64,
  pub name:        String,
  pub address:     String,
  pub ssn:         String,
  pub created_at:  DateTime<Utc>,
}

/// One debt record linking a client and a consumer. Accounts have no
/// natural key; the same (client, consumer) pair may carry many accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
  pub account_id:  i64,
  pub client_id:   i64,
  pub consumer_id: i64,
  pub balance:     Decimal,
  pub status:      AccountStatus,
  pub created_at:  DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_literal_roundtrip() {
    for s in ["IN_COLLECTION", "PAID_IN_FULL", "INACTIVE"] {
      assert_eq!(s.parse::<AccountStatus>().unwrap().as_str(), s);
    }
    assert!("CLOSED".parse::<AccountStatus>().is_err());
    assert!("in_collection".parse::<AccountStatus>().is_err());
  }

  #[test]
  fn balance_parses_to_scale_two() {
    assert_eq!(parse_balance("100").unwrap().to_string(), "100.00");
    assert_eq!(parse_balance("100.5").unwrap().to_string(), "100.50");
    assert_eq!(parse_balance("100.000").unwrap().to_string(), "100.00");
    assert_eq!(parse_balance("-3.25").unwrap().to_string(), "-3.25");
  }

  #[test]
  fn balance_rejects_garbage_and_excess_scale() {
    assert!(parse_balance("ten dollars").is_none());
    assert!(parse_balance("").is_none());
    assert!(parse_balance("100.555").is_none());
  }
}

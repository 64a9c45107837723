//! The `AccountStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `recoup-store-sqlite`).
//! Higher layers (`recoup-api`, the server binary) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{Account, AccountStatus, Agency, Client, Consumer};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`AccountStore::list_accounts`].
///
/// Absent fields impose no constraint; supplied fields combine
/// conjunctively. There is no OR mode.
#[derive(Debug, Clone, Default)]
pub struct AccountQuery {
  /// Inclusive lower bound on balance.
  pub min_balance:   Option<Decimal>,
  /// Inclusive upper bound on balance.
  pub max_balance:   Option<Decimal>,
  /// Case-insensitive substring match on the related consumer's name.
  pub consumer_name: Option<String>,
  pub status:        Option<AccountStatus>,
  /// Page size; defaults to 100.
  pub limit:         Option<usize>,
  pub offset:        Option<usize>,
}

/// One page of query results. `count` is the total number of matching rows
/// before `limit`/`offset` were applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
  pub count:   u64,
  pub results: Vec<T>,
}

/// Consumer fields embedded in the listing read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerDetail {
  pub name:    String,
  pub address: String,
  pub ssn:     String,
}

/// The listing read model: one account row joined with its consumer.
/// `client` is the client row id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
  pub client:   i64,
  pub consumer: ConsumerDetail,
  pub balance:  Decimal,
  pub status:   AccountStatus,
}

/// Row counts per entity table, used by the ingest summary and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityCounts {
  pub agencies:  u64,
  pub clients:   u64,
  pub consumers: u64,
  pub accounts:  u64,
}

// ─── Error classification ────────────────────────────────────────────────────

/// Implemented by store error types so transport layers can distinguish a
/// lost uniqueness race (reported as a conflict the caller may retry) from
/// an internal failure.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn is_constraint_violation(&self) -> bool {
    false
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an account store backend.
///
/// The get-or-create operations look rows up by natural key alone (agency
/// and client by `reference_no`, consumer by `ssn`) and create the row only
/// if absent. Non-key fields of an existing row are never touched. Each
/// call executes as an atomic check-then-create on the store's writer; a
/// race lost to another writer surfaces as a constraint-violation error and
/// is not retried.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait AccountStore: Send + Sync {
  type Error: StoreError;

  // ── Get-or-create by natural key ──────────────────────────────────────

  /// Resolve an agency by `reference_no`, creating it with `name` if
  /// absent. On a hit the stored name is kept, not overwritten. The bool
  /// reports whether a row was created.
  fn get_or_create_agency<'a>(
    &'a self,
    name: &'a str,
    reference_no: &'a str,
  ) -> impl Future<Output = Result<(Agency, bool), Self::Error>> + Send + 'a;

  /// Resolve a client by `reference_no`, creating it under `agency_id` if
  /// absent. `name` is only applied on creation; `None` leaves it empty.
  fn get_or_create_client<'a>(
    &'a self,
    agency_id: i64,
    reference_no: &'a str,
    name: Option<&'a str>,
  ) -> impl Future<Output = Result<(Client, bool), Self::Error>> + Send + 'a;

  /// Resolve a consumer by `ssn`, creating it with `name` and `address` if
  /// absent. An existing row keeps whatever name/address it was created
  /// with, even if the caller's values differ.
  fn get_or_create_consumer<'a>(
    &'a self,
    name: &'a str,
    address: &'a str,
    ssn: &'a str,
  ) -> impl Future<Output = Result<(Consumer, bool), Self::Error>> + Send + 'a;

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Insert a new account row. Always creates; accounts are intentionally
  /// never deduplicated, so ingesting the same data twice doubles them.
  fn create_account(
    &self,
    client_id: i64,
    consumer_id: i64,
    balance: Decimal,
    status: AccountStatus,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  /// Return accounts matching `query`, in insertion order, paginated.
  fn list_accounts<'a>(
    &'a self,
    query: &'a AccountQuery,
  ) -> impl Future<Output = Result<Page<AccountRecord>, Self::Error>> + Send + 'a;

  // ── By-id reads ───────────────────────────────────────────────────────

  fn get_agency(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Agency>, Self::Error>> + Send + '_;

  fn get_client(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Client>, Self::Error>> + Send + '_;

  fn get_consumer(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Consumer>, Self::Error>> + Send + '_;

  // ── Administration ────────────────────────────────────────────────────

  /// Delete an agency, cascading to its clients and, transitively, their
  /// accounts. Returns `false` if no such agency existed. This is the only
  /// deletion path; no entity is ever deleted directly.
  fn delete_agency(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Row counts for all four entity tables.
  fn entity_counts(
    &self,
  ) -> impl Future<Output = Result<EntityCounts, Self::Error>> + Send + '_;
}

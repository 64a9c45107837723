//! Integration tests for `SqliteStore` against an in-memory database,
//! including the ingestion reconciler driven through the CSV reader.

use recoup_core::{
  entity::AccountStatus,
  reconcile::{AgencyIdentity, ClientNaming, IngestError, ingest},
  store::{AccountQuery, AccountStore, StoreError as _},
};
use recoup_csv::RowReader;
use rust_decimal::Decimal;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn dec(s: &str) -> Decimal {
  s.parse().unwrap()
}

fn identity() -> AgencyIdentity {
  AgencyIdentity {
    name:         "Test Agency".into(),
    reference_no: "AGENCY001".into(),
  }
}

const HEADER: &str = "client reference no,consumer name,consumer address,ssn,balance,status";

fn rows(body: &str) -> RowReader<&[u8]> {
  // Leak is fine in tests; keeps callers on one line.
  let data = Box::leak(format!("{HEADER}\n{body}").into_boxed_str());
  RowReader::new(data.as_bytes()).expect("valid header")
}

// ─── Get-or-create ───────────────────────────────────────────────────────────

#[tokio::test]
async fn agency_get_or_create_reuses_by_reference_no() {
  let s = store().await;

  let (first, created) = s
    .get_or_create_agency("Test Agency", "AGENCY001")
    .await
    .unwrap();
  assert!(created);

  // Same reference, different name: existing row wins, name kept.
  let (second, created) = s
    .get_or_create_agency("Renamed Agency", "AGENCY001")
    .await
    .unwrap();
  assert!(!created);
  assert_eq!(second.agency_id, first.agency_id);
  assert_eq!(second.name, "Test Agency");

  assert_eq!(s.entity_counts().await.unwrap().agencies, 1);
}

#[tokio::test]
async fn client_name_applied_only_on_create() {
  let s = store().await;
  let (agency, _) = s.get_or_create_agency("A", "AG1").await.unwrap();

  let (client, created) = s
    .get_or_create_client(agency.agency_id, "CLIENT001", Some("John Doe"))
    .await
    .unwrap();
  assert!(created);
  assert_eq!(client.name, "John Doe");

  let (again, created) = s
    .get_or_create_client(agency.agency_id, "CLIENT001", Some("Jane Smith"))
    .await
    .unwrap();
  assert!(!created);
  assert_eq!(again.client_id, client.client_id);
  assert_eq!(again.name, "John Doe");

  // No name supplied: defaults to empty.
  let (unnamed, _) = s
    .get_or_create_client(agency.agency_id, "CLIENT002", None)
    .await
    .unwrap();
  assert_eq!(unnamed.name, "");
}

#[tokio::test]
async fn consumer_keeps_first_seen_fields() {
  let s = store().await;

  let (first, created) = s
    .get_or_create_consumer("John Doe", "123 Main St", "123-45-6789")
    .await
    .unwrap();
  assert!(created);

  let (second, created) = s
    .get_or_create_consumer("J. Doe", "999 Other Ave", "123-45-6789")
    .await
    .unwrap();
  assert!(!created);
  assert_eq!(second.consumer_id, first.consumer_id);
  assert_eq!(second.name, "John Doe");
  assert_eq!(second.address, "123 Main St");

  assert_eq!(s.entity_counts().await.unwrap().consumers, 1);
}

#[tokio::test]
async fn client_under_unknown_agency_is_constraint_error() {
  let s = store().await;

  let err = s
    .get_or_create_client(4242, "CLIENT001", None)
    .await
    .unwrap_err();
  assert!(err.is_constraint_violation(), "got: {err}");
}

// ─── Accounts ────────────────────────────────────────────────────────────────

async fn seed_account(
  s: &SqliteStore,
  client_ref: &str,
  consumer: (&str, &str, &str),
  balance: &str,
  status: AccountStatus,
) {
  let (agency, _) = s.get_or_create_agency("Test Agency", "AGENCY001").await.unwrap();
  let (client, _) = s
    .get_or_create_client(agency.agency_id, client_ref, None)
    .await
    .unwrap();
  let (consumer, _) = s
    .get_or_create_consumer(consumer.0, consumer.1, consumer.2)
    .await
    .unwrap();
  s.create_account(client.client_id, consumer.consumer_id, dec(balance), status)
    .await
    .unwrap();
}

#[tokio::test]
async fn accounts_are_never_deduplicated() {
  let s = store().await;
  let args = ("John Doe", "123 Main St", "123-45-6789");
  seed_account(&s, "CLIENT001", args, "100.00", AccountStatus::InCollection).await;
  seed_account(&s, "CLIENT001", args, "100.00", AccountStatus::InCollection).await;

  let counts = s.entity_counts().await.unwrap();
  assert_eq!(counts.accounts, 2);
  assert_eq!(counts.clients, 1);
  assert_eq!(counts.consumers, 1);
}

#[tokio::test]
async fn create_account_rescales_balance_to_cents() {
  let s = store().await;
  let (agency, _) = s.get_or_create_agency("A", "AG1").await.unwrap();
  let (client, _) = s
    .get_or_create_client(agency.agency_id, "CL1", None)
    .await
    .unwrap();
  let (consumer, _) = s
    .get_or_create_consumer("X", "Y", "000-00-0000")
    .await
    .unwrap();

  let account = s
    .create_account(
      client.client_id,
      consumer.consumer_id,
      dec("100.5"),
      AccountStatus::Inactive,
    )
    .await
    .unwrap();
  assert_eq!(account.balance.to_string(), "100.50");
}

// ─── Cascade delete ──────────────────────────────────────────────────────────

#[tokio::test]
async fn deleting_agency_cascades_to_clients_and_accounts() {
  let s = store().await;
  seed_account(
    &s,
    "CLIENT001",
    ("John Doe", "123 Main St", "123-45-6789"),
    "200.00",
    AccountStatus::InCollection,
  )
  .await;
  seed_account(
    &s,
    "CLIENT002",
    ("Jane Smith", "456 Elm St", "987-65-4321"),
    "500.00",
    AccountStatus::PaidInFull,
  )
  .await;

  let (agency, _) = s.get_or_create_agency("Test Agency", "AGENCY001").await.unwrap();
  assert!(s.delete_agency(agency.agency_id).await.unwrap());

  let counts = s.entity_counts().await.unwrap();
  assert_eq!(counts.agencies, 0);
  assert_eq!(counts.clients, 0);
  assert_eq!(counts.accounts, 0);
  // Consumers are only cascade-deleted through their own ancestor; an
  // agency is not one.
  assert_eq!(counts.consumers, 2);
}

#[tokio::test]
async fn delete_unknown_agency_reports_false() {
  let s = store().await;
  assert!(!s.delete_agency(99).await.unwrap());
}

// ─── Listing and filters ─────────────────────────────────────────────────────

async fn seed_two_accounts(s: &SqliteStore) {
  seed_account(
    s,
    "CLIENT001",
    ("John Doe", "123 Main St", "123-45-6789"),
    "200.00",
    AccountStatus::InCollection,
  )
  .await;
  seed_account(
    s,
    "CLIENT001",
    ("Jane Smith", "456 Elm St", "987-65-4321"),
    "500.00",
    AccountStatus::PaidInFull,
  )
  .await;
}

#[tokio::test]
async fn list_without_filters_returns_all_in_insertion_order() {
  let s = store().await;
  seed_two_accounts(&s).await;

  let page = s.list_accounts(&AccountQuery::default()).await.unwrap();
  assert_eq!(page.count, 2);
  assert_eq!(page.results[0].consumer.name, "John Doe");
  assert_eq!(page.results[0].balance.to_string(), "200.00");
  assert_eq!(page.results[1].consumer.name, "Jane Smith");
}

#[tokio::test]
async fn filters_combine_conjunctively() {
  let s = store().await;
  seed_two_accounts(&s).await;

  let page = s
    .list_accounts(&AccountQuery {
      min_balance: Some(dec("100")),
      max_balance: Some(dec("300")),
      status: Some(AccountStatus::InCollection),
      ..Default::default()
    })
    .await
    .unwrap();

  assert_eq!(page.count, 1);
  assert_eq!(page.results[0].consumer.name, "John Doe");
  assert_eq!(page.results[0].balance.to_string(), "200.00");
}

#[tokio::test]
async fn balance_bounds_are_inclusive() {
  let s = store().await;
  seed_two_accounts(&s).await;

  let page = s
    .list_accounts(&AccountQuery {
      min_balance: Some(dec("200.00")),
      max_balance: Some(dec("200.00")),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.count, 1);
  assert_eq!(page.results[0].consumer.name, "John Doe");
}

#[tokio::test]
async fn consumer_name_filter_is_case_insensitive_substring() {
  let s = store().await;
  seed_two_accounts(&s).await;

  for needle in ["john", "JOHN", "ohn d"] {
    let page = s
      .list_accounts(&AccountQuery {
        consumer_name: Some(needle.into()),
        ..Default::default()
      })
      .await
      .unwrap();
    assert_eq!(page.count, 1, "needle {needle:?}");
    assert_eq!(page.results[0].consumer.name, "John Doe");
  }
}

#[tokio::test]
async fn status_filter_matches_exactly() {
  let s = store().await;
  seed_two_accounts(&s).await;

  let page = s
    .list_accounts(&AccountQuery {
      status: Some(AccountStatus::PaidInFull),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.count, 1);
  assert_eq!(page.results[0].status, AccountStatus::PaidInFull);
}

#[tokio::test]
async fn pagination_limits_results_but_not_count() {
  let s = store().await;
  for i in 0..5 {
    seed_account(
      &s,
      "CLIENT001",
      ("John Doe", "123 Main St", "123-45-6789"),
      &format!("{i}.00"),
      AccountStatus::InCollection,
    )
    .await;
  }

  let page = s
    .list_accounts(&AccountQuery {
      limit: Some(2),
      offset: Some(1),
      ..Default::default()
    })
    .await
    .unwrap();

  assert_eq!(page.count, 5);
  assert_eq!(page.results.len(), 2);
  assert_eq!(page.results[0].balance.to_string(), "1.00");
  assert_eq!(page.results[1].balance.to_string(), "2.00");
}

// ─── Reconciler ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn ingest_creates_the_full_entity_graph() {
  let s = store().await;

  let summary = ingest(
    &s,
    &identity(),
    rows("CLIENT001,John Doe,123 Main St,123-45-6789,100.00,IN_COLLECTION"),
    ClientNaming::ConsumerName,
  )
  .await
  .unwrap();

  assert!(summary.agency_created);
  assert_eq!(summary.rows_read, 1);
  assert_eq!(summary.accounts_created, 1);
  assert_eq!(summary.clients_created, 1);
  assert_eq!(summary.consumers_created, 1);

  let page = s.list_accounts(&AccountQuery::default()).await.unwrap();
  assert_eq!(page.count, 1);
  assert_eq!(page.results[0].consumer.name, "John Doe");
  assert_eq!(page.results[0].consumer.ssn, "123-45-6789");
  assert_eq!(page.results[0].balance.to_string(), "100.00");
  assert_eq!(page.results[0].status, AccountStatus::InCollection);

  // CLI-style naming: the client takes the consumer's name.
  let client = s.get_client(1).await.unwrap().unwrap();
  assert_eq!(client.name, "John Doe");
  assert_eq!(client.reference_no, "CLIENT001");
}

#[tokio::test]
async fn http_naming_leaves_client_unnamed() {
  let s = store().await;

  ingest(
    &s,
    &identity(),
    rows("CLIENT001,John Doe,123 Main St,123-45-6789,100.00,IN_COLLECTION"),
    ClientNaming::Unnamed,
  )
  .await
  .unwrap();

  let client = s.get_client(1).await.unwrap().unwrap();
  assert_eq!(client.name, "");
}

#[tokio::test]
async fn reingest_doubles_accounts_but_nothing_else() {
  let s = store().await;
  let body = "CLIENT001,John Doe,123 Main St,123-45-6789,100.00,IN_COLLECTION\n\
              CLIENT002,Jane Smith,456 Elm St,987-65-4321,500.00,PAID_IN_FULL";

  ingest(&s, &identity(), rows(body), ClientNaming::ConsumerName)
    .await
    .unwrap();
  let second = ingest(&s, &identity(), rows(body), ClientNaming::ConsumerName)
    .await
    .unwrap();

  assert!(!second.agency_created);
  assert_eq!(second.clients_created, 0);
  assert_eq!(second.consumers_created, 0);
  assert_eq!(second.accounts_created, 2);

  let counts = s.entity_counts().await.unwrap();
  assert_eq!(counts.agencies, 1);
  assert_eq!(counts.clients, 2);
  assert_eq!(counts.consumers, 2);
  assert_eq!(counts.accounts, 4);
}

#[tokio::test]
async fn same_ssn_keeps_address_from_first_row() {
  let s = store().await;
  let body = "CLIENT001,John Doe,123 Main St,123-45-6789,100.00,IN_COLLECTION\n\
              CLIENT001,John Doe,777 Moved Ln,123-45-6789,50.00,INACTIVE";

  ingest(&s, &identity(), rows(body), ClientNaming::ConsumerName)
    .await
    .unwrap();

  let counts = s.entity_counts().await.unwrap();
  assert_eq!(counts.consumers, 1);
  assert_eq!(counts.accounts, 2);

  let consumer = s.get_consumer(1).await.unwrap().unwrap();
  assert_eq!(consumer.address, "123 Main St");
}

#[tokio::test]
async fn bad_status_aborts_at_that_row_keeping_prior_rows() {
  let s = store().await;
  let body = "CLIENT001,John Doe,123 Main St,123-45-6789,100.00,IN_COLLECTION\n\
              CLIENT002,Jane Smith,456 Elm St,987-65-4321,500.00,CLOSED\n\
              CLIENT003,Jim Beam,789 Oak St,555-55-5555,50.00,INACTIVE";

  let err = ingest(&s, &identity(), rows(body), ClientNaming::ConsumerName)
    .await
    .unwrap_err();

  assert!(err.is_validation());
  assert!(
    matches!(&err, IngestError::InvalidStatus { row: 2, value } if value.as_str() == "CLOSED"),
    "got: {err}"
  );

  // Row 1 committed, rows 2 and 3 not. Nothing from the failing row exists.
  let counts = s.entity_counts().await.unwrap();
  assert_eq!(counts.accounts, 1);
  assert_eq!(counts.clients, 1);
  assert_eq!(counts.consumers, 1);
}

#[tokio::test]
async fn bad_balance_aborts_before_creating_anything_for_the_row() {
  let s = store().await;

  let err = ingest(
    &s,
    &identity(),
    rows("CLIENT001,John Doe,123 Main St,123-45-6789,one hundred,IN_COLLECTION"),
    ClientNaming::ConsumerName,
  )
  .await
  .unwrap_err();

  assert!(matches!(&err, IngestError::InvalidBalance { row: 1, .. }), "got: {err}");

  let counts = s.entity_counts().await.unwrap();
  assert_eq!(counts.clients, 0);
  assert_eq!(counts.consumers, 0);
  assert_eq!(counts.accounts, 0);
  // The agency is resolved before any row, so it does exist.
  assert_eq!(counts.agencies, 1);
}

#[tokio::test]
async fn balance_with_excess_scale_is_a_validation_error() {
  let s = store().await;

  let err = ingest(
    &s,
    &identity(),
    rows("CLIENT001,John Doe,123 Main St,123-45-6789,100.555,IN_COLLECTION"),
    ClientNaming::ConsumerName,
  )
  .await
  .unwrap_err();

  assert!(matches!(err, IngestError::InvalidBalance { row: 1, .. }));
}

#[tokio::test]
async fn second_ingest_does_not_rename_agency() {
  let s = store().await;
  let body = "CLIENT001,John Doe,123 Main St,123-45-6789,100.00,IN_COLLECTION";

  ingest(&s, &identity(), rows(body), ClientNaming::ConsumerName)
    .await
    .unwrap();

  let renamed = AgencyIdentity {
    name:         "Totally Different Agency".into(),
    reference_no: identity().reference_no,
  };
  ingest(&s, &renamed, rows(body), ClientNaming::ConsumerName)
    .await
    .unwrap();

  assert_eq!(s.entity_counts().await.unwrap().agencies, 1);
  let agency = s.get_agency(1).await.unwrap().unwrap();
  assert_eq!(agency.name, "Test Agency");
}

#[tokio::test]
async fn malformed_record_midfile_keeps_prior_rows() {
  let s = store().await;
  // Second record has too few fields.
  let body = "CLIENT001,John Doe,123 Main St,123-45-6789,100.00,IN_COLLECTION\n\
              CLIENT002,Jane Smith";

  let err = ingest(&s, &identity(), rows(body), ClientNaming::ConsumerName)
    .await
    .unwrap_err();

  assert!(matches!(&err, IngestError::Row { row: 2, .. }), "got: {err}");
  assert_eq!(s.entity_counts().await.unwrap().accounts, 1);
}

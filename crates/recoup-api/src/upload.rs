//! Handler for `POST /upload-csv`, multipart CSV ingestion.
//!
//! The body must carry three parts: `file` (the delimited text), and the
//! text fields `agency_name` and `agency_reference_no`. On success the
//! response is 201 with a fixed JSON acknowledgement.
//!
//! Rows before a failing row stay committed; there is deliberately no
//! whole-file transaction.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Multipart, State},
  http::StatusCode,
  response::IntoResponse,
};
use recoup_core::{
  reconcile::{AgencyIdentity, ClientNaming, ingest},
  store::AccountStore,
};
use recoup_csv::RowReader;
use serde_json::json;

use crate::error::ApiError;

/// `POST /upload-csv` with multipart fields `file`, `agency_name`,
/// `agency_reference_no`.
pub async fn upload_csv<S>(
  State(store): State<Arc<S>>,
  mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccountStore,
{
  let mut file: Option<Vec<u8>> = None;
  let mut agency_name: Option<String> = None;
  let mut agency_reference_no: Option<String> = None;

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
  {
    let name = field.name().unwrap_or("").to_owned();
    match name.as_str() {
      "file" => {
        let bytes = field
          .bytes()
          .await
          .map_err(|e| ApiError::BadRequest(format!("reading file part: {e}")))?;
        file = Some(bytes.to_vec());
      }
      "agency_name" => {
        agency_name = Some(text_field(&name, field).await?);
      }
      "agency_reference_no" => {
        agency_reference_no = Some(text_field(&name, field).await?);
      }
      // Unknown parts are ignored, matching lenient form handling.
      _ => {}
    }
  }

  let file = file.ok_or_else(|| missing("file"))?;
  let identity = AgencyIdentity {
    name:         require_non_empty("agency_name", agency_name)?,
    reference_no: require_non_empty("agency_reference_no", agency_reference_no)?,
  };

  let reader = RowReader::new(file.as_slice())
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let summary = ingest(store.as_ref(), &identity, reader, ClientNaming::Unnamed)
    .await
    .map_err(ApiError::from_ingest)?;

  tracing::info!(
    agency = %identity.reference_no,
    accounts = summary.accounts_created,
    clients = summary.clients_created,
    consumers = summary.consumers_created,
    "csv ingested"
  );

  Ok((
    StatusCode::CREATED,
    Json(json!({
      "status": "success",
      "message": "CSV data ingested successfully",
    })),
  ))
}

async fn text_field(
  name: &str,
  field: axum::extract::multipart::Field<'_>,
) -> Result<String, ApiError> {
  field
    .text()
    .await
    .map_err(|e| ApiError::BadRequest(format!("reading {name} part: {e}")))
}

fn missing(name: &str) -> ApiError {
  ApiError::BadRequest(format!("missing multipart field: {name}"))
}

fn require_non_empty(name: &str, value: Option<String>) -> Result<String, ApiError> {
  match value {
    Some(v) if !v.is_empty() => Ok(v),
    Some(_) => Err(ApiError::BadRequest(format!("empty multipart field: {name}"))),
    None => Err(missing(name)),
  }
}

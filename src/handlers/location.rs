//! Location submission and listing handlers.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use metrics::counter;
use tracing::debug;

use crate::errors::ApiError;
use crate::metrics::STORE_OPERATIONS_TOTAL;
use crate::model::LocationRecord;
use crate::AppState;

/// `POST /location` -- parse, validate and persist one check-in.
///
/// The record is stored under `<team>/<name>/location.json`; repeated
/// submissions from the same team+name land on the same key, and history
/// is preserved only by the store's own versioning.
#[utoipa::path(
    post,
    path = "/location",
    tag = "Location",
    operation_id = "SubmitLocation",
    request_body = LocationRecord,
    responses(
        (status = 200, description = "Record stored, body is the literal \"ok\""),
        (status = 400, description = "Malformed or missing required field")
    )
)]
pub async fn submit_location(state: Arc<AppState>, body: &[u8]) -> Result<Response, ApiError> {
    let record = LocationRecord::parse(body)?;
    let key = record.storage_key();

    let serialized =
        serde_json::to_vec(&record).map_err(|e| ApiError::Internal(anyhow::Error::from(e)))?;

    debug!("Storing check-in for {}/{} at {}", record.team, record.name, key);

    let result = state.store.put(&key, Bytes::from(serialized)).await;
    counter!(STORE_OPERATIONS_TOTAL, "operation" => "put", "status" => op_status(&result))
        .increment(1);
    result?;

    Ok((StatusCode::OK, "ok").into_response())
}

/// `GET /location` -- return every stored check-in, most recent first.
///
/// Enumerates all keys, fetches every retained version when
/// `listing.include_history` is set (falling back to the current object
/// for keys without version history), and sorts by submission timestamp
/// descending.  Cost is O(keys × versions) sequential store calls.
#[utoipa::path(
    get,
    path = "/location",
    tag = "Location",
    operation_id = "ListLocations",
    responses(
        (status = 200, description = "All stored check-ins, newest first", body = [LocationRecord]),
        (status = 401, description = "Wrong or missing password header")
    )
)]
pub async fn list_locations(state: Arc<AppState>) -> Result<Response, ApiError> {
    let keys_result = state.store.list_keys().await;
    counter!(STORE_OPERATIONS_TOTAL, "operation" => "list_keys", "status" => op_status(&keys_result))
        .increment(1);
    let keys = keys_result?;

    let mut records: Vec<LocationRecord> = Vec::new();

    for key in keys {
        let versions = if state.config.listing.include_history {
            let result = state.store.list_versions(&key).await;
            counter!(STORE_OPERATIONS_TOTAL, "operation" => "list_versions", "status" => op_status(&result))
                .increment(1);
            result?
        } else {
            Vec::new()
        };

        if versions.is_empty() {
            // Unversioned store (or history disabled): current object only.
            let result = state.store.get(&key).await;
            counter!(STORE_OPERATIONS_TOTAL, "operation" => "get", "status" => op_status(&result))
                .increment(1);
            records.push(decode_record(&key, &result?)?);
        } else {
            for version_id in versions {
                let result = state.store.get_version(&key, &version_id).await;
                counter!(STORE_OPERATIONS_TOTAL, "operation" => "get_version", "status" => op_status(&result))
                    .increment(1);
                records.push(decode_record(&key, &result?)?);
            }
        }
    }

    records.sort_by(|a, b| b.date.cmp(&a.date));

    let body = serde_json::to_string(&records)
        .map_err(|e| ApiError::Internal(anyhow::Error::from(e)))?;

    Ok((
        StatusCode::OK,
        [("content-type", "application/json")],
        body,
    )
        .into_response())
}

/// Deserialize a stored body back into a record.
fn decode_record(key: &str, body: &[u8]) -> Result<LocationRecord, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        ApiError::Internal(anyhow::anyhow!("Corrupt record at {key}: {e}"))
    })
}

/// Metric status label for a store call result.
fn op_status<T>(result: &Result<T, crate::storage::store::StoreError>) -> &'static str {
    if result.is_ok() {
        "ok"
    } else {
        "error"
    }
}

//! The wire dispatch handler
//!
//! Resolves the operation named by the target header, decodes the body into
//! the typed request, and hands it to the intercepting handler.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use domain::{Operation, OperationKind, OperationOutput};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::state::AppState;
use crate::wire::{TARGET_HEADER, TARGET_PREFIX};

/// Handle one wire request.
pub async fn dispatch(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<OperationOutput>, ApiError> {
    let target = headers
        .get(TARGET_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::MissingTarget)?;
    let name = target
        .strip_prefix(TARGET_PREFIX)
        .ok_or_else(|| ApiError::UnknownOperation(target.to_string()))?;
    let kind: OperationKind = name
        .parse()
        .map_err(|_| ApiError::UnknownOperation(name.to_string()))?;

    let op = decode_operation(kind, &body)?;
    let output = state.handler.handle(op).await?;
    Ok(Json(output))
}

fn decode_operation(kind: OperationKind, body: &[u8]) -> Result<Operation, ApiError> {
    let op = match kind {
        OperationKind::CreateTable => Operation::CreateTable(decode(body)?),
        OperationKind::DeleteTable => Operation::DeleteTable(decode(body)?),
        OperationKind::UpdateTable => Operation::UpdateTable(decode(body)?),
        OperationKind::DescribeTable => Operation::DescribeTable(decode(body)?),
        OperationKind::ListTables => Operation::ListTables(decode(body)?),
        OperationKind::PutItem => Operation::PutItem(decode(body)?),
        OperationKind::GetItem => Operation::GetItem(decode(body)?),
        OperationKind::DeleteItem => Operation::DeleteItem(decode(body)?),
        OperationKind::UpdateItem => Operation::UpdateItem(decode(body)?),
        OperationKind::BatchGetItem => Operation::BatchGetItem(decode(body)?),
        OperationKind::BatchWriteItem => Operation::BatchWriteItem(decode(body)?),
        OperationKind::Query => Operation::Query(decode(body)?),
        OperationKind::Scan => Operation::Scan(decode(body)?),
        OperationKind::DescribeStream => Operation::DescribeStream(decode(body)?),
        OperationKind::ListStreams => Operation::ListStreams(decode(body)?),
        OperationKind::GetShardIterator => Operation::GetShardIterator(decode(body)?),
        OperationKind::GetRecords => Operation::GetRecords(decode(body)?),
    };
    Ok(op)
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    // An absent body is treated as the empty request, the way clients send
    // parameterless operations like ListTables.
    let body = if body.is_empty() { b"{}" } else { body };
    serde_json::from_slice(body).map_err(|e| ApiError::Malformed(e.to_string()))
}

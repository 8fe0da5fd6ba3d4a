//! Resource operation handlers
//!
//! Each handler validates its input, builds one [`OperationRequest`], hands
//! it to the dispatcher and renders the outcome. Exactly one dispatch to
//! exactly one device per call; no retries, no caching, no reordering.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use lwm2m_core::{OperationKind, OperationRequest, ResourcePath, WriteValue};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ReadResponse {
    pub success: bool,
    pub path: String,
    pub value: String,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct WriteResponse {
    pub success: bool,
    pub path: String,
    #[serde(rename = "writtenValue")]
    pub written_value: serde_json::Value,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct ExecuteResponse {
    pub success: bool,
    pub path: String,
    pub executed: bool,
    pub arguments: String,
    pub timestamp: String,
}

#[derive(Deserialize)]
pub struct WriteBody {
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// GET /api/clients/{endpoint}/read/{object_id}/{instance_id}/{resource_id}
pub async fn read_resource(
    State(state): State<AppState>,
    Path((endpoint, object_id, instance_id, resource_id)): Path<(String, u16, u16, u16)>,
) -> Result<Json<ReadResponse>, ApiError> {
    let path = ResourcePath::new(object_id, instance_id, resource_id);
    let outcome = state
        .dispatcher()
        .dispatch(&endpoint, OperationRequest::Read(path))
        .await?;
    let payload = ApiError::check_outcome(OperationKind::Read, outcome)?;

    Ok(Json(ReadResponse {
        success: true,
        path: path.to_string(),
        value: payload,
        timestamp: timestamp(),
    }))
}

/// POST /api/clients/{endpoint}/write/{object_id}/{instance_id}/{resource_id}
pub async fn write_resource(
    State(state): State<AppState>,
    Path((endpoint, object_id, instance_id, resource_id)): Path<(String, u16, u16, u16)>,
    Json(body): Json<WriteBody>,
) -> Result<Json<WriteResponse>, ApiError> {
    // validated before any dispatch happens
    let value = match body.value {
        Some(value) if !value.is_null() => value,
        _ => return Err(ApiError::MissingValue),
    };

    let path = ResourcePath::new(object_id, instance_id, resource_id);
    let request = OperationRequest::Write(path, WriteValue::from_json(&value));
    let outcome = state.dispatcher().dispatch(&endpoint, request).await?;
    ApiError::check_outcome(OperationKind::Write, outcome)?;

    Ok(Json(WriteResponse {
        success: true,
        path: path.to_string(),
        written_value: value,
        timestamp: timestamp(),
    }))
}

/// POST /api/clients/{endpoint}/execute/{object_id}/{instance_id}/{resource_id}
///
/// The body is optional; `arguments` defaults to the empty string.
pub async fn execute_resource(
    State(state): State<AppState>,
    Path((endpoint, object_id, instance_id, resource_id)): Path<(String, u16, u16, u16)>,
    body: String,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let arguments = parse_arguments(&body);

    let path = ResourcePath::new(object_id, instance_id, resource_id);
    let request = OperationRequest::Execute(path, arguments.clone());
    let outcome = state.dispatcher().dispatch(&endpoint, request).await?;
    ApiError::check_outcome(OperationKind::Execute, outcome)?;

    Ok(Json(ExecuteResponse {
        success: true,
        path: path.to_string(),
        executed: true,
        arguments,
        timestamp: timestamp(),
    }))
}

/// Pull `arguments` out of an optional JSON body; anything non-string is
/// stringified, absent or unparsable bodies mean no arguments
fn parse_arguments(body: &str) -> String {
    if body.trim().is_empty() {
        return String::new();
    }
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|parsed| parsed.get("arguments").cloned())
        .map(|arguments| match arguments {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_default()
}

//! API error types and conversions
//!
//! Every failure path produces an explicit, typed response with a stable
//! error vocabulary, so callers can apply differentiated retry policy:
//! retry on timeout/transport faults, not on protocol failures or unknown
//! endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use lwm2m_core::{GatewayError, OperationKind, OperationOutcome};

/// API error type that converts to HTTP responses
#[derive(Debug)]
pub enum ApiError {
    /// 404 - no live session for the endpoint
    ClientNotFound,
    /// 400 - write request without a value
    MissingValue,
    /// 400 - device rejected the operation
    OperationFailed {
        kind: OperationKind,
        message: String,
    },
    /// 400 - no device reply within the bound
    OperationTimeout { kind: OperationKind },
    /// 500 - transport-level fault
    TransportFault {
        kind: OperationKind,
        message: String,
    },
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ApiError {
    /// Split an operation outcome into its success payload or the matching
    /// error response
    pub fn check_outcome(kind: OperationKind, outcome: OperationOutcome) -> Result<String, Self> {
        match outcome {
            OperationOutcome::Success { payload } => Ok(payload),
            OperationOutcome::ProtocolFailure { message } => {
                Err(ApiError::OperationFailed { kind, message })
            }
            OperationOutcome::Timeout => Err(ApiError::OperationTimeout { kind }),
            OperationOutcome::TransportFault { message } => {
                Err(ApiError::TransportFault { kind, message })
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::ClientNotFound => (StatusCode::NOT_FOUND, "Client not found".to_string()),
            ApiError::MissingValue => (
                StatusCode::BAD_REQUEST,
                "Missing 'value' field in request body".to_string(),
            ),
            ApiError::OperationFailed { kind, message } => (
                StatusCode::BAD_REQUEST,
                format!("Failed to {} resource: {}", kind.verb(), message),
            ),
            ApiError::OperationTimeout { kind } => (
                StatusCode::BAD_REQUEST,
                format!("Failed to {} resource: timeout", kind.verb()),
            ),
            ApiError::TransportFault { kind, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Exception {} resource: {}", kind.gerund(), message),
            ),
        };

        if status.is_server_error() {
            tracing::error!(%message, "API error");
        } else {
            tracing::debug!(%message, "API client error");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::DeviceNotFound(_) => ApiError::ClientNotFound,
        }
    }
}

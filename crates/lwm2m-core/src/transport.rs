//! Device transport seam
//!
//! The gateway reaches the device protocol stack through a single narrow
//! capability: send one request to one session and wait for its reply. One
//! production implementation binds to the real CoAP stack; tests use a
//! scripted double.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{DeviceSession, OperationRequest};

/// Protocol-level result of a request that reached the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceReply {
    /// Device accepted the operation; payload is the raw value text
    /// (empty for write/execute)
    Success { payload: String },
    /// Device rejected the operation; message is the device-reported text
    Failure { message: String },
}

/// Transport-level faults, distinct from protocol-level rejections
#[derive(Debug, Error, Clone)]
pub enum TransportError {
    #[error("Timeout waiting for device reply")]
    Timeout,

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Device address unavailable: {0}")]
    AddressUnavailable(String),

    #[error("Transport closed")]
    Closed,
}

/// Transport-agnostic interface for device communication
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// Send one operation request to the device behind `session` and wait up
    /// to `timeout` for its reply.
    ///
    /// Called exactly once per dispatch; retransmission, if any, is the
    /// transport's own concern.
    async fn send(
        &self,
        session: &DeviceSession,
        request: &OperationRequest,
        timeout: Duration,
    ) -> Result<DeviceReply, TransportError>;
}

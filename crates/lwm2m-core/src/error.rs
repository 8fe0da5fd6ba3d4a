//! Common error types for the gateway core

use thiserror::Error;

/// Result type for gateway core operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors raised by the gateway core before a request reaches the transport
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No live session for the requested endpoint
    #[error("Client not found: {0}")]
    DeviceNotFound(String),
}

//! Synchronous request dispatcher
//!
//! Translates one `(endpoint, OperationRequest)` pair into an
//! [`OperationOutcome`], enforcing a fixed wall-clock bound on the wait for a
//! device reply. All three operation kinds share the same dispatch-and-wait
//! shape, so one outcome-handling path serves read, write and execute alike.

use std::sync::Arc;
use std::time::Duration;

use crate::error::GatewayResult;
use crate::models::{OperationOutcome, OperationRequest};
use crate::registry::DeviceRegistry;
use crate::transport::{DeviceReply, DeviceTransport, TransportError};
use crate::DEFAULT_REQUEST_TIMEOUT_MS;

/// Dispatches resource operations to devices with a bounded wait.
///
/// The timeout is a process-wide default fixed at construction; it is not
/// renewable and not configurable per call. A caller abandoning the HTTP
/// request does not cancel an in-flight dispatch — the wait runs to reply or
/// timeout.
pub struct RequestDispatcher {
    registry: Arc<DeviceRegistry>,
    transport: Arc<dyn DeviceTransport>,
    timeout: Duration,
}

impl RequestDispatcher {
    pub fn new(registry: Arc<DeviceRegistry>, transport: Arc<dyn DeviceTransport>) -> Self {
        Self::with_timeout(
            registry,
            transport,
            Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        )
    }

    pub fn with_timeout(
        registry: Arc<DeviceRegistry>,
        transport: Arc<dyn DeviceTransport>,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            transport,
            timeout,
        }
    }

    /// Resolve the endpoint, issue the operation once, and wait for the
    /// outcome.
    ///
    /// An unknown endpoint short-circuits to `DeviceNotFound` without
    /// touching the transport. The dispatcher never retries; differentiated
    /// retry policy belongs to the caller (retry on `Timeout`/
    /// `TransportFault`, not on `ProtocolFailure`).
    pub async fn dispatch(
        &self,
        endpoint: &str,
        request: OperationRequest,
    ) -> GatewayResult<OperationOutcome> {
        let session = self.registry.lookup(endpoint)?;

        tracing::debug!(
            endpoint = %endpoint,
            operation = %request.kind(),
            path = %request.path(),
            timeout_ms = self.timeout.as_millis() as u64,
            "Dispatching request"
        );

        // The outer timeout holds the wall-clock bound even if the transport
        // implementation never returns. A reply arriving after the bound is
        // dropped, never surfaced as a late success.
        let sent = tokio::time::timeout(
            self.timeout,
            self.transport.send(&session, &request, self.timeout),
        )
        .await;

        let outcome = match sent {
            Err(_) | Ok(Err(TransportError::Timeout)) => OperationOutcome::Timeout,
            Ok(Ok(DeviceReply::Success { payload })) => OperationOutcome::Success { payload },
            Ok(Ok(DeviceReply::Failure { message })) => OperationOutcome::ProtocolFailure { message },
            Ok(Err(err)) => OperationOutcome::TransportFault {
                message: err.to_string(),
            },
        };

        match &outcome {
            OperationOutcome::Success { .. } => {
                tracing::debug!(endpoint = %endpoint, path = %request.path(), "Request succeeded");
            }
            other => {
                tracing::debug!(endpoint = %endpoint, path = %request.path(), outcome = ?other, "Request did not succeed");
            }
        }

        Ok(outcome)
    }
}

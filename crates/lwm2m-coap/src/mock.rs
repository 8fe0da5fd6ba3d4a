//! Mock device transport for testing

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use lwm2m_core::{
    DeviceReply, DeviceSession, DeviceTransport, OperationKind, OperationRequest, ResourcePath,
    TransportError,
};

/// Scripted [`DeviceTransport`] double.
///
/// Replies are consumed front-to-back; when the script is empty, `send`
/// answers with an empty protocol success. The call counter backs the
/// "not-found short-circuits without a dispatch" assertions.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Result<DeviceReply, TransportError>>>,
    latency: Mutex<Option<Duration>>,
    calls: AtomicUsize,
    last_request: Mutex<Option<RecordedRequest>>,
}

/// What the mock saw on its most recent `send`
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub endpoint: String,
    pub kind: OperationKind,
    pub path: ResourcePath,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an exact reply
    pub fn enqueue(&self, reply: Result<DeviceReply, TransportError>) {
        self.replies.lock().push_back(reply);
    }

    /// Queue a protocol success carrying `payload`
    pub fn enqueue_success(&self, payload: impl Into<String>) {
        self.enqueue(Ok(DeviceReply::Success {
            payload: payload.into(),
        }));
    }

    /// Queue a protocol failure carrying the device error text
    pub fn enqueue_failure(&self, message: impl Into<String>) {
        self.enqueue(Ok(DeviceReply::Failure {
            message: message.into(),
        }));
    }

    /// Delay every reply, for timeout tests
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    /// How many times `send` was invoked
    pub fn send_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request, if any
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.last_request.lock().clone()
    }
}

#[async_trait]
impl DeviceTransport for MockTransport {
    async fn send(
        &self,
        session: &DeviceSession,
        request: &OperationRequest,
        _timeout: Duration,
    ) -> Result<DeviceReply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(RecordedRequest {
            endpoint: session.endpoint.clone(),
            kind: request.kind(),
            path: request.path(),
        });

        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        self.replies.lock().pop_front().unwrap_or_else(|| {
            Ok(DeviceReply::Success {
                payload: String::new(),
            })
        })
    }
}

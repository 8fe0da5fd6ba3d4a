//! Application state for the gateway API

use std::sync::Arc;

use lwm2m_core::{DeviceRegistry, RequestDispatcher};

/// State shared across all handlers.
///
/// Constructed once at process start and passed in explicitly, so handlers
/// can be exercised with fake registries and transports.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<DeviceRegistry>,
    dispatcher: Arc<RequestDispatcher>,
}

impl AppState {
    pub fn new(registry: Arc<DeviceRegistry>, dispatcher: Arc<RequestDispatcher>) -> Self {
        Self {
            registry,
            dispatcher,
        }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }
}

//! lwm2m-core - Core types and logic for the LwM2M REST gateway
//!
//! This crate holds the pieces with real design content: the device session
//! registry, the resource addressing model, and the request dispatcher that
//! turns an `(endpoint, operation)` pair into a bounded, well-typed outcome.
//!
//! The device protocol stack itself is reached through the narrow
//! [`DeviceTransport`] trait, so the dispatcher can be exercised with a test
//! double and bound to a real CoAP stack in production.

pub mod dispatcher;
pub mod error;
pub mod models;
pub mod registry;
pub mod transport;

pub use dispatcher::RequestDispatcher;
pub use error::{GatewayError, GatewayResult};
pub use models::*;
pub use registry::DeviceRegistry;
pub use transport::{DeviceReply, DeviceTransport, TransportError};

/// Default upper bound on the wait for a device reply, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

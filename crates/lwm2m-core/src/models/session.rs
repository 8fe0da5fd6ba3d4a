//! Device session models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A live registration of a connected device.
///
/// Created and maintained exclusively by the transport layer's registration
/// lifecycle; the core reads sessions but never mutates them field-by-field.
/// Replacing a session means replacing the whole value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSession {
    /// Endpoint name the device chose at registration; unique key
    pub endpoint: String,
    /// Opaque identifier assigned when the session was established
    pub registration_id: String,
    /// Transport-level address currently used to reach the device
    pub address: String,
    /// When the device first registered
    pub registered_at: DateTime<Utc>,
    /// Last registration refresh; always >= `registered_at`
    pub last_update: DateTime<Utc>,
    /// Device-declared validity window in seconds (display only; staleness
    /// detection belongs to the transport layer)
    pub lifetime: u64,
    /// Optional secondary contact channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_number: Option<String>,
    /// Resource-tree advertisements, in the order the device declared them
    pub object_links: Vec<String>,
}

/// Registration lifecycle event pushed by the transport layer.
///
/// The registry applies these verbatim; the core never creates or removes a
/// session on its own initiative.
#[derive(Debug, Clone)]
pub enum RegistrationEvent {
    /// A device registered (or re-registered, replacing its old session)
    Registered(DeviceSession),
    /// A device refreshed its presence
    Updated(DeviceSession),
    /// A device deregistered or was detected unreachable
    Deregistered { endpoint: String },
}

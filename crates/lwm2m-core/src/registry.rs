//! Device session registry
//!
//! Holds the live set of connected devices keyed by endpoint name. Mutations
//! are driven exclusively by the transport layer's registration lifecycle
//! events; request handlers only read.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{GatewayError, GatewayResult};
use crate::models::{DeviceSession, RegistrationEvent};

/// In-memory directory of live device sessions.
///
/// Whole sessions are replaced on write, so a concurrent `lookup` sees either
/// the old session or the new one, never a partially-updated mix. State is
/// authoritative only for the current process lifetime.
#[derive(Default)]
pub struct DeviceRegistry {
    sessions: RwLock<HashMap<String, DeviceSession>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all current sessions, taken at call time.
    ///
    /// Iterating the result never observes mutations that happen after the
    /// call returns.
    pub fn list(&self) -> Vec<DeviceSession> {
        self.sessions.read().values().cloned().collect()
    }

    /// Look up the live session for an endpoint
    pub fn lookup(&self, endpoint: &str) -> GatewayResult<DeviceSession> {
        self.sessions
            .read()
            .get(endpoint)
            .cloned()
            .ok_or_else(|| GatewayError::DeviceNotFound(endpoint.to_string()))
    }

    /// Insert a session, replacing any earlier session for the same endpoint
    pub fn insert(&self, session: DeviceSession) {
        let mut sessions = self.sessions.write();
        if let Some(old) = sessions.insert(session.endpoint.clone(), session) {
            tracing::debug!(
                endpoint = %old.endpoint,
                old_registration_id = %old.registration_id,
                "Replaced existing session"
            );
        }
    }

    /// Remove the session for an endpoint, if any
    pub fn remove(&self, endpoint: &str) -> Option<DeviceSession> {
        self.sessions.write().remove(endpoint)
    }

    /// Apply one registration lifecycle event from the transport layer
    pub fn apply(&self, event: RegistrationEvent) {
        match event {
            RegistrationEvent::Registered(session) => {
                tracing::info!(
                    endpoint = %session.endpoint,
                    registration_id = %session.registration_id,
                    address = %session.address,
                    "Device registered"
                );
                self.insert(session);
            }
            RegistrationEvent::Updated(session) => {
                tracing::debug!(
                    endpoint = %session.endpoint,
                    registration_id = %session.registration_id,
                    "Device registration refreshed"
                );
                self.insert(session);
            }
            RegistrationEvent::Deregistered { endpoint } => {
                tracing::info!(endpoint = %endpoint, "Device deregistered");
                self.remove(&endpoint);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

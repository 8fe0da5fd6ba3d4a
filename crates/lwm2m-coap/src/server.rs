//! CoAP socket loop, registration interface and request sending
//!
//! One UDP socket serves both directions: incoming datagrams are either
//! device *requests* (the LwM2M registration interface) or *responses* to a
//! request the gateway sent earlier, matched back to the waiting caller by
//! token.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use coap_lite::{CoapOption, MessageClass, MessageType, Packet, RequestType, ResponseType};
use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::sync::{broadcast, oneshot};
use uuid::Uuid;

use lwm2m_core::{
    DeviceReply, DeviceSession, DeviceTransport, OperationRequest, RegistrationEvent,
    TransportError,
};

use crate::codec;

type PendingMap = Arc<Mutex<HashMap<Vec<u8>, oneshot::Sender<Packet>>>>;

/// Lifetime a device gets when it registers without declaring one (seconds)
const DEFAULT_LIFETIME_SECS: u64 = 86400;

/// Registration event channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// CoAP binding configuration
#[derive(Debug, Clone)]
pub struct CoapConfig {
    /// Address the UDP socket binds to
    pub bind: SocketAddr,
}

impl Default for CoapConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5683".parse().expect("static address"),
        }
    }
}

/// Production [`DeviceTransport`] bound to a CoAP/UDP socket.
///
/// Also owns the registration interface: devices register, refresh and
/// deregister against this socket, and each lifecycle change is pushed as a
/// [`RegistrationEvent`] for the registry to apply.
pub struct CoapTransport {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    /// In-flight requests awaiting a response, keyed by token
    pending: PendingMap,
    /// Sessions keyed by registration id; the transport is the authority on
    /// session construction, the registry on endpoint resolution
    registrations: Arc<Mutex<HashMap<String, DeviceSession>>>,
    events_tx: broadcast::Sender<RegistrationEvent>,
    next_message_id: AtomicU16,
    next_token: AtomicU32,
}

impl CoapTransport {
    /// Bind the socket and start the receive loop
    pub async fn bind(config: &CoapConfig) -> Result<Arc<Self>, TransportError> {
        let socket = UdpSocket::bind(config.bind)
            .await
            .map_err(|e| TransportError::SendFailed(format!("bind {}: {}", config.bind, e)))?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let transport = Arc::new(Self {
            socket: Arc::new(socket),
            local_addr,
            pending: Arc::new(Mutex::new(HashMap::new())),
            registrations: Arc::new(Mutex::new(HashMap::new())),
            events_tx,
            next_message_id: AtomicU16::new(1),
            next_token: AtomicU32::new(1),
        });

        tracing::info!(addr = %local_addr, "CoAP transport listening");

        let recv = transport.clone();
        tokio::spawn(async move {
            recv.receive_loop().await;
        });

        Ok(transport)
    }

    /// Address the socket actually bound to (useful with port 0 in tests)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Subscribe to registration lifecycle events
    pub fn events(&self) -> broadcast::Receiver<RegistrationEvent> {
        self.events_tx.subscribe()
    }

    /// Number of requests currently awaiting a device reply
    pub fn pending_requests(&self) -> usize {
        self.pending.lock().len()
    }

    async fn receive_loop(&self) {
        let mut buf = [0u8; 2048];
        loop {
            let (len, src) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    tracing::warn!(error = %e, "CoAP socket receive failed");
                    continue;
                }
            };

            let packet = match Packet::from_bytes(&buf[..len]) {
                Ok(packet) => packet,
                Err(e) => {
                    tracing::debug!(src = %src, error = ?e, "Dropping malformed datagram");
                    continue;
                }
            };

            match packet.header.code {
                MessageClass::Response(_) => self.complete_pending(packet),
                MessageClass::Request(method) => {
                    self.handle_device_request(method, packet, src).await;
                }
                // empty ACKs and resets carry no state for us
                _ => {}
            }
        }
    }

    /// Route a response packet to whoever is waiting on its token
    fn complete_pending(&self, packet: Packet) {
        let token = packet.get_token().to_vec();
        let waiter = self.pending.lock().remove(&token);
        match waiter {
            Some(tx) => {
                let _ = tx.send(packet);
            }
            // reply arrived after the dispatcher's bound; drop it
            None => {
                tracing::debug!(token = ?token, "Dropping unmatched or late response");
            }
        }
    }

    async fn handle_device_request(&self, method: RequestType, packet: Packet, src: SocketAddr) {
        let path = codec::uri_path(&packet);
        let segments: Vec<&str> = path.iter().map(String::as_str).collect();

        let response = match (method, segments.as_slice()) {
            (RequestType::Post, ["rd"]) => self.register(&packet, src),
            (RequestType::Post, ["rd", id]) => self.update(id, &packet, src),
            (RequestType::Delete, ["rd", id]) => self.deregister(id),
            _ => {
                tracing::debug!(method = ?method, path = ?path, src = %src, "Unhandled CoAP request");
                Reply::error(ResponseType::NotFound)
            }
        };

        self.send_reply(&packet, response, src).await;
    }

    /// `POST /rd?ep=<endpoint>&lt=<lifetime>&sms=<number>` — register
    fn register(&self, packet: &Packet, src: SocketAddr) -> Reply {
        let queries = codec::uri_queries(packet);
        let endpoint = match queries.get("ep") {
            Some(ep) if !ep.is_empty() => ep.clone(),
            _ => {
                tracing::debug!(src = %src, "Registration without endpoint name");
                return Reply::error(ResponseType::BadRequest);
            }
        };

        let lifetime = queries
            .get("lt")
            .and_then(|lt| lt.parse().ok())
            .unwrap_or(DEFAULT_LIFETIME_SECS);

        let mut registration_id = Uuid::new_v4().simple().to_string();
        registration_id.truncate(10);

        let now = Utc::now();
        let session = DeviceSession {
            endpoint: endpoint.clone(),
            registration_id: registration_id.clone(),
            address: src.to_string(),
            registered_at: now,
            last_update: now,
            lifetime,
            sms_number: queries.get("sms").cloned(),
            object_links: codec::parse_object_links(&packet.payload),
        };

        {
            let mut registrations = self.registrations.lock();
            // a re-registration invalidates the endpoint's previous session id
            registrations.retain(|_, s| s.endpoint != endpoint);
            registrations.insert(registration_id.clone(), session.clone());
        }

        self.emit(RegistrationEvent::Registered(session));
        Reply::created(registration_id)
    }

    /// `POST /rd/{id}?lt=<lifetime>` — registration refresh
    fn update(&self, registration_id: &str, packet: &Packet, src: SocketAddr) -> Reply {
        let queries = codec::uri_queries(packet);
        let updated = {
            let mut registrations = self.registrations.lock();
            match registrations.get_mut(registration_id) {
                Some(session) => {
                    session.last_update = Utc::now();
                    session.address = src.to_string();
                    if let Some(lifetime) = queries.get("lt").and_then(|lt| lt.parse().ok()) {
                        session.lifetime = lifetime;
                    }
                    if !packet.payload.is_empty() {
                        session.object_links = codec::parse_object_links(&packet.payload);
                    }
                    Some(session.clone())
                }
                None => None,
            }
        };

        match updated {
            Some(session) => {
                self.emit(RegistrationEvent::Updated(session));
                Reply::ok(ResponseType::Changed)
            }
            None => {
                tracing::debug!(registration_id = %registration_id, "Update for unknown registration");
                Reply::error(ResponseType::NotFound)
            }
        }
    }

    /// `DELETE /rd/{id}` — deregister
    fn deregister(&self, registration_id: &str) -> Reply {
        let removed = self.registrations.lock().remove(registration_id);
        match removed {
            Some(session) => {
                self.emit(RegistrationEvent::Deregistered {
                    endpoint: session.endpoint,
                });
                Reply::ok(ResponseType::Deleted)
            }
            None => Reply::error(ResponseType::NotFound),
        }
    }

    fn emit(&self, event: RegistrationEvent) {
        // no subscriber yet is fine; the daemon attaches one before serving
        let _ = self.events_tx.send(event);
    }

    async fn send_reply(&self, request: &Packet, reply: Reply, dst: SocketAddr) {
        let mut packet = Packet::new();
        packet.header.set_type(MessageType::Acknowledgement);
        packet.header.message_id = request.header.message_id;
        packet.header.code = MessageClass::Response(reply.code);
        packet.set_token(request.get_token().to_vec());
        if let Some(location) = reply.location {
            packet.add_option(CoapOption::LocationPath, b"rd".to_vec());
            packet.add_option(CoapOption::LocationPath, location.into_bytes());
        }

        match packet.to_bytes() {
            Ok(bytes) => {
                if let Err(e) = self.socket.send_to(&bytes, dst).await {
                    tracing::warn!(dst = %dst, error = %e, "Failed to send CoAP reply");
                }
            }
            Err(e) => tracing::warn!(error = ?e, "Failed to encode CoAP reply"),
        }
    }

    fn next_token(&self) -> Vec<u8> {
        self.next_token
            .fetch_add(1, Ordering::Relaxed)
            .to_be_bytes()
            .to_vec()
    }
}

/// Removes a pending-map entry when the awaiting future goes away.
///
/// `send` can be cancelled mid-await: the dispatcher's outer timeout or an
/// abandoned HTTP request drops the future without running its tail. Tying
/// removal to `Drop` keeps the map from accumulating dead waiters for
/// devices that never reply.
struct PendingGuard {
    pending: PendingMap,
    token: Vec<u8>,
}

impl PendingGuard {
    fn insert(pending: &PendingMap, token: Vec<u8>, tx: oneshot::Sender<Packet>) -> Self {
        pending.lock().insert(token.clone(), tx);
        Self {
            pending: pending.clone(),
            token,
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.token);
    }
}

/// Outcome of a registration-interface request
struct Reply {
    code: ResponseType,
    location: Option<String>,
}

impl Reply {
    fn created(registration_id: String) -> Self {
        Self {
            code: ResponseType::Created,
            location: Some(registration_id),
        }
    }

    fn ok(code: ResponseType) -> Self {
        Self {
            code,
            location: None,
        }
    }

    fn error(code: ResponseType) -> Self {
        Self {
            code,
            location: None,
        }
    }
}

#[async_trait]
impl DeviceTransport for CoapTransport {
    async fn send(
        &self,
        session: &DeviceSession,
        request: &OperationRequest,
        timeout: Duration,
    ) -> Result<DeviceReply, TransportError> {
        let dst: SocketAddr = session
            .address
            .parse()
            .map_err(|_| TransportError::AddressUnavailable(session.address.clone()))?;

        let message_id = self.next_message_id.fetch_add(1, Ordering::Relaxed);
        let token = self.next_token();
        let packet = codec::encode_request(request, message_id, token.clone());
        let bytes = packet
            .to_bytes()
            .map_err(|e| TransportError::SendFailed(format!("encode: {:?}", e)))?;

        let (tx, rx) = oneshot::channel();
        let _guard = PendingGuard::insert(&self.pending, token, tx);

        if let Err(e) = self.socket.send_to(&bytes, dst).await {
            return Err(TransportError::SendFailed(e.to_string()));
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => codec::parse_reply(&response),
            Ok(Err(_)) => Err(TransportError::Closed),
            Err(_) => Err(TransportError::Timeout),
        }
    }
}

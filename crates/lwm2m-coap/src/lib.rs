//! lwm2m-coap - CoAP transport binding for the LwM2M gateway
//!
//! Binds the gateway's [`DeviceTransport`](lwm2m_core::DeviceTransport) seam
//! to a real CoAP stack over plain UDP (NoSec), and serves the LwM2M
//! registration interface (`POST /rd`, `POST /rd/{id}`, `DELETE /rd/{id}`)
//! that feeds the device registry with lifecycle events.
//!
//! Message framing uses `coap-lite`; retransmission and security (DTLS) are
//! out of scope for this binding.

pub mod codec;
pub mod mock;
pub mod server;

pub use mock::MockTransport;
pub use server::{CoapConfig, CoapTransport};

//! Integration tests for the LwM2M gateway
//!
//! This crate contains end-to-end tests that exercise the full stack:
//! - REST API layer against the core with a scripted transport double
//! - CoAP registration interface and request dispatch over real UDP sockets
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lwm2m-tests
//! ```
//!
//! # Test Structure
//!
//! - `api_e2e_test.rs` - router-level tests with `MockTransport`
//! - `coap_e2e_test.rs` - UDP tests with a raw-socket fake device

// This crate only contains tests, no library code

//! lwm2m-api - REST API layer for the LwM2M gateway
//!
//! Exposes the device directory and the three resource operations
//! (read/write/execute) as a small HTTP surface over the core registry and
//! dispatcher. The layer holds no state of its own beyond [`AppState`].
//!
//! # Usage
//!
//! ```ignore
//! use lwm2m_api::{create_router, AppState};
//!
//! let state = AppState::new(registry, dispatcher);
//! let router = create_router(state);
//! ```

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the gateway REST router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Device directory
        .route("/api/clients", get(handlers::clients::list_clients))
        .route("/api/clients/{endpoint}", get(handlers::clients::get_client))
        // Resource operations
        .route(
            "/api/clients/{endpoint}/read/{object_id}/{instance_id}/{resource_id}",
            get(handlers::resources::read_resource),
        )
        .route(
            "/api/clients/{endpoint}/write/{object_id}/{instance_id}/{resource_id}",
            post(handlers::resources::write_resource),
        )
        .route(
            "/api/clients/{endpoint}/execute/{object_id}/{instance_id}/{resource_id}",
            post(handlers::resources::execute_resource),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

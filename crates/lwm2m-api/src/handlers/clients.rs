//! Device directory handlers

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use lwm2m_core::DeviceSession;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ClientSummary {
    pub endpoint: String,
    pub link: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetailResponse {
    pub endpoint: String,
    pub registration_id: String,
    pub address: String,
    pub registration_date: String,
    pub last_update: String,
    pub lifetime: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_number: Option<String>,
    pub object_links: Vec<String>,
}

impl From<DeviceSession> for ClientDetailResponse {
    fn from(session: DeviceSession) -> Self {
        Self {
            endpoint: session.endpoint,
            registration_id: session.registration_id,
            address: session.address,
            registration_date: session.registered_at.to_rfc3339(),
            last_update: session.last_update.to_rfc3339(),
            lifetime: session.lifetime,
            sms_number: session.sms_number,
            object_links: session.object_links,
        }
    }
}

/// GET /api/clients
/// List all currently registered devices
pub async fn list_clients(State(state): State<AppState>) -> Json<Vec<ClientSummary>> {
    let clients: Vec<ClientSummary> = state
        .registry()
        .list()
        .into_iter()
        .map(|session| ClientSummary {
            link: format!("/api/clients/{}", session.endpoint),
            endpoint: session.endpoint,
        })
        .collect();

    Json(clients)
}

/// GET /api/clients/{endpoint}
/// Get the full session record for one device
pub async fn get_client(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
) -> Result<Json<ClientDetailResponse>, ApiError> {
    let session = state.registry().lookup(&endpoint)?;
    Ok(Json(session.into()))
}

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::device::{DeviceIdentity, RegistrationError, register_device};
use crate::portal::{Envelope, PortalRequest};

use super::{AppState, PORTAL_PATHS, REGISTER_PATH};

#[derive(Debug, Default, Deserialize)]
pub struct PortalQuery {
    pub action: Option<String>,
    pub cmd: Option<String>,
    pub mac: Option<String>,
}

/// Root endpoint — service overview.
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state
        .portal
        .registry()
        .map(|r| r.describe())
        .unwrap_or_else(|| "none".to_string());

    Json(json!({
        "portal": PORTAL_PATHS,
        "register": REGISTER_PATH,
        "playlist": state.portal.catalog().location(),
        "registry": registry,
    }))
}

/// Portal endpoint. Answers every request with a `{"js": ...}` envelope.
pub async fn portal(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<PortalQuery>, QueryRejection>,
) -> Json<Envelope> {
    let query = match query {
        Ok(Query(query)) => query,
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable portal query, treating as empty");
            PortalQuery::default()
        }
    };

    let identity = DeviceIdentity::from_request(&headers, query.mac.as_deref());
    let request = PortalRequest {
        action: query.action,
        cmd: query.cmd,
        identity,
    };

    Json(state.portal.dispatch(request).await)
}

/// CORS preflight for the portal endpoint.
pub async fn portal_preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Device registration endpoint.
pub async fn register(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let body = match serde_json::from_slice::<Value>(&body) {
        Ok(body) if !body.is_null() => body,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid request" })),
            );
        }
    };

    let mac = body.get("mac").and_then(Value::as_str).unwrap_or_default();

    match register_device(state.portal.registry(), mac).await {
        Ok(record) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Device registered successfully",
                "mac": record.mac,
            })),
        ),
        Err(RegistrationError::InvalidMac) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid MAC address format" })),
        ),
        Err(e @ RegistrationError::Store(_)) => {
            tracing::error!(error = %e, "Device registration failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to register device" })),
            )
        }
    }
}

// handlers/public/ops.rs - service descriptor, liveness, ping

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Localserve API",
        "version": version,
        "description": "Backend API for a local-services marketplace",
        "endpoints": {
            "ping": "/ping (public)",
            "health": "/health (public)",
            "auth": "/auth/signup, /auth/login (public - token acquisition)",
            "profile": "/api/profile (protected)",
            "messages": "/api/messages (protected)",
            "assist": "/api/assist, /api/assist/profile-summary (protected)",
        }
    }))
}

pub async fn ping(method: Method, uri: Uri) -> Json<Value> {
    Json(json!({ "ok": true, "method": method.as_str(), "url": uri.to_string() }))
}

/// Empty 204 for OPTIONS on public routes, mirroring the protected surface.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "timestamp": now,
                "error": "database unavailable",
                "database_error": e.to_string()
            })),
        ),
    }
}

// handlers/protected/messages.rs - the messaging data path
//
// GET  /api/messages?peer_id=&limit=  -> thread between caller and peer
// GET  /api/messages                  -> conversation list (per-peer rollup)
// POST /api/messages                  -> send one message

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Extension, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::store::ScopedStore;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    /// Present -> thread mode; absent -> conversation-list mode.
    pub peer_id: Option<Uuid>,
    pub limit: Option<i64>,
}

/// POST /api/messages - persist one message from the caller.
///
/// The sender is always the resolved caller identity; the body only supplies
/// the recipient and content. Repeated identical POSTs create duplicate rows
/// (there is no idempotency key).
pub async fn send(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(payload) = payload?;

    let recipient_id = payload
        .get("recipient_id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok());
    let content = payload
        .get("content")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let (recipient_id, content) = match (recipient_id, content) {
        (Some(r), Some(c)) => (r, c),
        _ => return Err(ApiError::bad_request("recipient_id and content required")),
    };

    let scoped = ScopedStore::new(state.store.clone(), auth_user);
    let message = scoped.send_message(recipient_id, content).await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": message }))))
}

/// GET /api/messages - thread or conversation-list read, branched on peer_id.
pub async fn read(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<MessagesQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let scoped = ScopedStore::new(state.store.clone(), auth_user);

    match query.peer_id {
        Some(peer_id) => {
            let messages = scoped.thread(peer_id, query.limit).await?;
            Ok(Json(json!({ "messages": messages })))
        }
        None => {
            // Latest message per distinct peer, computed by the store's
            // aggregation; returned as-is with no re-sorting here.
            let conversations = scoped.conversations().await?;
            Ok(Json(json!({ "conversations": conversations })))
        }
    }
}

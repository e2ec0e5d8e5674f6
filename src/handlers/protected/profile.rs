// handlers/protected/profile.rs - GET/PUT /api/profile for the caller

use axum::{
    extract::rejection::JsonRejection,
    extract::{Extension, State},
    response::Json,
};
use serde_json::{json, Value};

use crate::database::models::ProfileUpdate;
use crate::database::store::ScopedStore;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;

/// GET /api/profile - the caller's own profile, or null if never set.
pub async fn get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let scoped = ScopedStore::new(state.store.clone(), auth_user);
    let profile = scoped.profile().await?;
    Ok(Json(json!({ "profile": profile })))
}

/// PUT /api/profile - upsert the caller's profile. Absent fields clear.
pub async fn put(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;

    let update = ProfileUpdate {
        name: string_field(&payload, "name"),
        avatar_url: string_field(&payload, "avatar_url"),
        bio: string_field(&payload, "bio"),
    };

    let scoped = ScopedStore::new(state.store.clone(), auth_user);
    let profile = scoped.update_profile(update).await?;
    Ok(Json(json!({ "profile": profile })))
}

fn string_field(payload: &Value, field: &str) -> Option<String> {
    payload
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

// handlers/public/auth.rs - token acquisition: POST /auth/signup, POST /auth/login

use axum::{
    extract::rejection::JsonRejection, extract::State, http::StatusCode, response::Json,
};
use serde_json::{json, Value};

use crate::auth::{generate_jwt, hash_password, verify_password, Claims};
use crate::database::models::{ProfileUpdate, PublicUser};
use crate::error::ApiError;
use crate::AppState;

/// POST /auth/signup - create a user account and its seed profile row.
///
/// Body: `{ "email": string, "password": string, "metadata": { "name"?, "avatar_url"? } }`
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(payload) = payload?;

    let email = required_string(&payload, "email")?;
    let password = required_string(&payload, "password")?;

    let user = state
        .store
        .create_user(&email, &hash_password(&password))
        .await?;

    // Seed the profile from optional metadata so clients can render something
    // immediately after signup.
    let metadata = payload.get("metadata");
    let seed = ProfileUpdate {
        name: metadata
            .and_then(|m| m.get("name"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
        avatar_url: metadata
            .and_then(|m| m.get("avatar_url"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
        bio: None,
    };
    state.store.upsert_profile(user.id, seed).await?;

    let public = PublicUser::from(user);
    Ok((StatusCode::CREATED, Json(json!({ "user": public }))))
}

/// POST /auth/login - exchange credentials for a bearer token.
///
/// Body: `{ "email": string, "password": string }`
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;

    let email = required_string(&payload, "email")?;
    let password = required_string(&payload, "password")?;

    let user = state
        .store
        .user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    if !verify_password(&password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let claims = Claims::new(user.id, user.email.clone());
    let token = generate_jwt(claims).map_err(|e| {
        tracing::error!("token generation failed: {}", e);
        ApiError::internal_server_error("Internal error")
    })?;

    let public = PublicUser::from(user);
    Ok(Json(json!({ "access_token": token, "user": public })))
}

/// Pull a required, non-empty string field out of a body that may be any JSON
/// shape; fails closed on anything else.
fn required_string(payload: &Value, field: &str) -> Result<String, ApiError> {
    payload
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request("email and password required"))
}

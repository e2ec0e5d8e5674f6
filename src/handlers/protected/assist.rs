// handlers/protected/assist.rs - generative-text endpoints
//
// Upstream failures degrade to static copy inside AssistClient; these
// handlers only fail on malformed input.

use axum::{extract::rejection::JsonRejection, extract::State, response::Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::services::ProfileFacts;
use crate::AppState;

/// POST /api/assist - free-text prompt, plain text answer.
pub async fn prompt(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;

    let prompt = payload
        .get("prompt")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("prompt required"))?;

    let text = state.assist.generate(prompt).await;
    Ok(Json(json!({ "text": text })))
}

/// POST /api/assist/profile-summary - structured provider summary.
pub async fn profile_summary(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;

    let facts: ProfileFacts = serde_json::from_value(payload)
        .map_err(|_| ApiError::bad_request("name, service and bio required"))?;

    let summary = state.assist.profile_summary(&facts).await;
    Ok(Json(json!({
        "summary": summary.summary,
        "highlights": summary.highlights,
        "notes": summary.notes,
    })))
}

pub mod assist;
pub mod messages;
pub mod profile;

use crate::error::ApiError;

/// Shared fallback for protected routes hit with an unsupported method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

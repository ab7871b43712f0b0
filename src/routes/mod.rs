use axum::{routing::get, Router};

use crate::error::ApiError;
use crate::state::AppState;

pub mod health;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
}

/// Unknown paths.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".into())
}

/// Known path, unsupported method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{error, instrument};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Tasks API online",
    })
}

/// Reports store connectivity; 500 when the store cannot be reached.
#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let timestamp = OffsetDateTime::now_utc();
    match state.store.list_collections().await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "OK",
                timestamp,
                database: "connected",
                error: None,
            }),
        ),
        Err(e) => {
            error!(error = %e, "health check: store unreachable");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse {
                    status: "ERROR",
                    timestamp,
                    database: "disconnected",
                    error: Some("Database unreachable".into()),
                }),
            )
        }
    }
}

//! Health check endpoint
//!
//! Liveness only; does not contact the upstream API or the external scorer.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok" while the process serves requests
    pub status: &'static str,
    /// Seconds since startup
    pub uptime: f64,
}

/// GET /_health handler
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            uptime: state.uptime_seconds(),
        }),
    )
}

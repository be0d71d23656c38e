//! Health Routes
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (feed connected)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;
use crate::listener::ConnectionState;

/// GET /health/live
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// 200 only while the scoreboard feed is connected.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    match state.connection_state() {
        ConnectionState::Connected => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// GET /health
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let connection = state.connection_state();
    let (series, revision) = {
        let snapshot = state.snapshots.borrow();
        (snapshot.series_count(), snapshot.revision)
    };

    let status = match connection {
        ConnectionState::Connected => "healthy",
        _ => "degraded",
    };

    Json(HealthResponse {
        status: status.to_string(),
        connection,
        series,
        revision,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

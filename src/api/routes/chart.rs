//! Chart Routes
//!
//! - GET /api/v1/chart - Whole chart as last published
//! - GET /api/v1/chart/series/:team - A single team's series

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::chart::{ChartSnapshot, SeriesSnapshot};

/// GET /api/v1/chart
pub async fn get_chart(State(state): State<Arc<AppState>>) -> Json<ChartSnapshot> {
    Json(state.snapshot())
}

/// GET /api/v1/chart/series/:team
pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Path(team): Path<String>,
) -> ApiResult<Json<SeriesSnapshot>> {
    state
        .snapshots
        .borrow()
        .series(&team)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No series for team {}", team)))
}

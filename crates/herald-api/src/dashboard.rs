use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use herald_types::api::HealthResponse;
use herald_types::models::{ActionLogEntry, DashboardStats};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

pub async fn root() -> &'static str {
    "Bot Running"
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, ApiError> {
    Ok(Json(state.db.dashboard_stats()?))
}

pub async fn action_log(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Vec<ActionLogEntry>>, ApiError> {
    Ok(Json(state.db.recent_actions(query.limit.min(200))?))
}

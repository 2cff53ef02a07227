use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use herald_broadcast::BroadcastLedger;
use herald_types::api::BroadcastRequest;
use herald_types::models::BroadcastRun;

use crate::error::ApiError;
use crate::state::AppState;

/// Telegram rejects longer `sendMessage` texts.
const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    20
}

/// POST /broadcasts: runs the broadcast to completion before answering.
pub async fn send_broadcast(
    State(state): State<AppState>,
    Json(req): Json<BroadcastRequest>,
) -> Result<(StatusCode, Json<BroadcastRun>), ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::Validation("message must not be empty".into()));
    }
    if req.message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::Validation(format!(
            "message exceeds {} characters",
            MAX_MESSAGE_CHARS
        )));
    }

    let run = state.dispatcher.run_broadcast(&req.message).await?;

    state.record_action(format!(
        "broadcast #{}: {} delivered, {} failed",
        run.id, run.success_count, run.failed_count
    ));

    Ok((StatusCode::CREATED, Json(run)))
}

pub async fn recent_broadcasts(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<BroadcastRun>>, ApiError> {
    let runs = state.db.recent(query.limit.min(200))?;
    Ok(Json(runs))
}

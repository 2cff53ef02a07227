use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use herald_broadcast::RecipientStore;
use herald_types::api::BlockResponse;
use herald_types::models::{Recipient, RecipientId};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_recipients(
    State(state): State<AppState>,
) -> Result<Json<Vec<Recipient>>, ApiError> {
    Ok(Json(state.db.all()?))
}

/// Idempotent: removing an unknown id still answers 204.
pub async fn remove_recipient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let id = RecipientId(id);
    state.db.remove(id)?;

    info!(recipient = %id, "Recipient removed");
    state.record_action(format!("recipient {} removed", id));

    Ok(StatusCode::NO_CONTENT)
}

pub async fn block_recipient(
    state: State<AppState>,
    id: Path<i64>,
) -> Result<Json<BlockResponse>, ApiError> {
    set_blocked(state, id, true).await
}

pub async fn unblock_recipient(
    state: State<AppState>,
    id: Path<i64>,
) -> Result<Json<BlockResponse>, ApiError> {
    set_blocked(state, id, false).await
}

async fn set_blocked(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    blocked: bool,
) -> Result<Json<BlockResponse>, ApiError> {
    let recipient = RecipientId(id);
    if !state.db.set_blocked(recipient, blocked)? {
        return Err(ApiError::NotFound(format!("recipient {}", recipient)));
    }

    let verb = if blocked { "blocked" } else { "unblocked" };
    info!(recipient = %recipient, "Recipient {}", verb);
    state.record_action(format!("recipient {} {}", recipient, verb));

    Ok(Json(BlockResponse { id, blocked }))
}

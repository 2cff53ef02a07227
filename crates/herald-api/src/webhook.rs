use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};
use serde_json::json;
use tracing::debug;

use herald_types::telegram::{Update, WebhookInfo};

use crate::error::ApiError;
use crate::state::AppState;

pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// POST /webhook: inbound update from Telegram. The sender is registered
/// before the command handler runs.
pub async fn receive_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> Result<&'static str, ApiError> {
    if let Some(expected) = &state.webhook.secret {
        let given = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if given != Some(expected.as_str()) {
            return Err(ApiError::Forbidden);
        }
    }

    debug!(update_id = update.update_id, "Update received");
    state.ingress.handle_update(&update).await?;

    Ok("OK")
}

/// POST /webhook/set: (re)register this server's webhook with Telegram.
pub async fn set_webhook(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let endpoint = state
        .webhook
        .endpoint()
        .ok_or(ApiError::WebhookNotConfigured)?;

    state
        .bot
        .set_webhook(&endpoint, state.webhook.secret.as_deref())
        .await?;
    state.record_action(format!("webhook set to {}", endpoint));

    Ok(Json(json!({ "ok": true, "url": endpoint })))
}

pub async fn webhook_status(
    State(state): State<AppState>,
) -> Result<Json<WebhookInfo>, ApiError> {
    Ok(Json(state.bot.webhook_info().await?))
}

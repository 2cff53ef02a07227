pub mod auth;
pub mod broadcasts;
pub mod dashboard;
pub mod error;
pub mod middleware;
pub mod recipients;
pub mod state;
pub mod webhook;

#[cfg(test)]
mod tests;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};

pub use error::ApiError;
pub use state::{AppState, AppStateInner, AuthSettings, WebhookSettings};

/// All HTTP routes. Layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(dashboard::root))
        .route("/health", get(dashboard::health))
        .route("/webhook", post(webhook::receive_update))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/dashboard", get(dashboard::stats))
        .route("/logs", get(dashboard::action_log))
        .route("/recipients", get(recipients::list_recipients))
        .route("/recipients/{id}", delete(recipients::remove_recipient))
        .route("/recipients/{id}/block", post(recipients::block_recipient))
        .route("/recipients/{id}/unblock", post(recipients::unblock_recipient))
        .route(
            "/broadcasts",
            get(broadcasts::recent_broadcasts).post(broadcasts::send_broadcast),
        )
        .route("/webhook/set", post(webhook::set_webhook))
        .route("/webhook/status", get(webhook::webhook_status))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

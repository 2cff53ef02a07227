use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use herald_broadcast::{Dispatcher, IngressAdapter};
use herald_db::Database;
use herald_telegram::BotApi;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub dispatcher: Dispatcher,
    pub ingress: IngressAdapter,
    pub bot: Arc<BotApi>,
    pub auth: AuthSettings,
    pub webhook: WebhookSettings,
}

pub struct AuthSettings {
    /// Argon2 PHC string of the operator password.
    pub password_hash: String,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
}

#[derive(Default)]
pub struct WebhookSettings {
    /// Public base URL; the webhook is registered at `{public_url}/webhook`.
    pub public_url: Option<String>,
    /// Expected value of `X-Telegram-Bot-Api-Secret-Token`.
    pub secret: Option<String>,
}

impl WebhookSettings {
    pub fn endpoint(&self) -> Option<String> {
        self.public_url
            .as_deref()
            .map(|base| format!("{}/webhook", base.trim_end_matches('/')))
    }
}

impl AppStateInner {
    /// Appends to the operator action log. A failure here never fails the
    /// action being logged.
    pub fn record_action(&self, action: impl AsRef<str>) {
        if let Err(e) = self.db.insert_action(action.as_ref(), Utc::now()) {
            warn!(error = %e, "Failed to write action log");
        }
    }
}

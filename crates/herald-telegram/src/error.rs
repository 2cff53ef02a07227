use thiserror::Error;

use herald_broadcast::DeliveryError;

#[derive(Debug, Error)]
pub enum TelegramError {
    /// Network or decoding failure. The request URL is stripped because it
    /// embeds the bot token.
    #[error("http: {0}")]
    Http(reqwest::Error),

    #[error("api error {code}: {description}")]
    Api {
        code: i64,
        description: String,
        retry_after: Option<u64>,
    },

    #[error("api answered ok without a result")]
    MissingResult,
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

impl From<TelegramError> for DeliveryError {
    fn from(e: TelegramError) -> Self {
        match e {
            TelegramError::Http(e) => DeliveryError::Transport(e.to_string()),
            TelegramError::Api {
                code: 429,
                retry_after,
                ..
            } => DeliveryError::RateLimited { retry_after },
            // "Forbidden: bot was blocked by the user" / "user is deactivated"
            TelegramError::Api { code: 403, .. } => DeliveryError::RecipientBlocked,
            TelegramError::Api {
                code, description, ..
            } => DeliveryError::Rejected { code, description },
            TelegramError::MissingResult => {
                DeliveryError::Transport("api answered ok without a result".into())
            }
        }
    }
}

use async_trait::async_trait;
use thiserror::Error;

use herald_types::models::RecipientId;

/// Why a single delivery failed.
///
/// The variants exist for logs only. The dispatcher counts every one of
/// them as a failed delivery and never branches on the kind.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limited by transport (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("recipient blocked the bot")]
    RecipientBlocked,

    #[error("rejected ({code}): {description}")]
    Rejected { code: i64, description: String },
}

/// Outbound transport used to send one message to one recipient.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn deliver(&self, recipient: RecipientId, text: &str) -> Result<(), DeliveryError>;
}

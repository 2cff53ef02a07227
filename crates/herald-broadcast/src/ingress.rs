use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use herald_types::models::RecipientId;
use herald_types::telegram::Update;

use crate::store::{RecipientStore, StorageError};

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Command handling for inbound updates (replies, menus, ...).
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    async fn handle(&self, update: &Update) -> Result<(), HandlerError>;
}

/// Boundary between the platform's inbound updates and the core: registers
/// every sender as a recipient, then hands the update to the handler.
#[derive(Clone)]
pub struct IngressAdapter {
    store: Arc<dyn RecipientStore>,
    handler: Arc<dyn UpdateHandler>,
}

impl IngressAdapter {
    pub fn new(store: Arc<dyn RecipientStore>, handler: Arc<dyn UpdateHandler>) -> Self {
        Self { store, handler }
    }

    pub fn on_inbound_update(
        &self,
        sender_id: RecipientId,
        sender_name: &str,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if self.store.upsert_new(sender_id, sender_name, occurred_at)? {
            info!(recipient = %sender_id, "New recipient registered");
        }
        Ok(())
    }

    /// Registration happens before the handler runs, so a `/start` reply
    /// never precedes the sender becoming a recipient. Handler failures are
    /// logged and swallowed; storage failures are returned.
    pub async fn handle_update(&self, update: &Update) -> Result<(), StorageError> {
        match update.sender() {
            Some(user) if !user.is_bot => {
                let occurred_at = update
                    .message()
                    .and_then(|m| DateTime::from_timestamp(m.date, 0))
                    .filter(|ts| ts.timestamp() > 0)
                    .unwrap_or_else(Utc::now);
                self.on_inbound_update(RecipientId(user.id), &user.first_name, occurred_at)?;
            }
            Some(_) => debug!(update_id = update.update_id, "Skipping bot sender"),
            None => debug!(update_id = update.update_id, "Update has no sender"),
        }

        if let Err(e) = self.handler.handle(update).await {
            warn!(update_id = update.update_id, error = %e, "Update handler failed");
        }

        Ok(())
    }
}

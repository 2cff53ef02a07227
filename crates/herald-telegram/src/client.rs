use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use herald_broadcast::{DeliveryChannel, DeliveryError};
use herald_types::models::RecipientId;
use herald_types::telegram::{
    ApiResponse, ReplyKeyboardMarkup, SendMessage, SetWebhook, WebhookInfo,
};

use crate::error::TelegramError;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimal Telegram Bot API client. One instance per bot token, shared by
/// the dispatcher, the command handler and the webhook routes.
pub struct BotApi {
    client: Client,
    /// `{api_url}/bot{token}`, never logged.
    endpoint: String,
}

impl BotApi {
    pub fn new(api_url: &str, token: &str) -> Result<Self, TelegramError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    async fn call<P, T>(&self, method: &str, payload: &P) -> Result<T, TelegramError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.endpoint, method);
        // Error responses carry a JSON envelope too, so the status code is
        // not checked separately.
        let resp: ApiResponse<T> = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await?
            .json()
            .await?;

        if !resp.ok {
            return Err(TelegramError::Api {
                code: resp.error_code.unwrap_or_default(),
                description: resp.description.unwrap_or_default(),
                retry_after: resp.parameters.and_then(|p| p.retry_after),
            });
        }

        resp.result.ok_or(TelegramError::MissingResult)
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&ReplyKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        let payload = SendMessage {
            chat_id,
            text,
            reply_markup: keyboard,
        };
        let _: serde_json::Value = self.call("sendMessage", &payload).await?;
        debug!(chat_id, "Message sent");
        Ok(())
    }

    pub async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<(), TelegramError> {
        let _: bool = self
            .call("setWebhook", &SetWebhook { url, secret_token })
            .await?;
        info!("Webhook set to {}", url);
        Ok(())
    }

    pub async fn webhook_info(&self) -> Result<WebhookInfo, TelegramError> {
        self.call("getWebhookInfo", &serde_json::json!({})).await
    }
}

#[async_trait]
impl DeliveryChannel for BotApi {
    async fn deliver(&self, recipient: RecipientId, text: &str) -> Result<(), DeliveryError> {
        self.send_message(recipient.0, text, None)
            .await
            .map_err(DeliveryError::from)
    }
}

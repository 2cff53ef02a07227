//! Subset of the Telegram Bot API wire format used by Herald.
//!
//! Only the fields the bot reads are modelled; unknown fields are ignored on
//! deserialization so newer API versions keep parsing.

use serde::{Deserialize, Serialize};

// -- Inbound --

/// An incoming update delivered to the webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_message: Option<Message>,
}

impl Update {
    /// The message carried by this update, new or edited.
    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref().or(self.edited_message.as_ref())
    }

    /// The user who caused this update, if any. Channel posts and service
    /// updates have no sender.
    pub fn sender(&self) -> Option<&User> {
        self.message().and_then(|m| m.from.as_ref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub date: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Message {
    /// Bot command name without the leading slash or `@botname` suffix.
    /// `"/start@herald_bot payload"` yields `Some("start")`.
    pub fn command(&self) -> Option<&str> {
        let text = self.text.as_deref()?;
        let first = text.split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        if name.is_empty() { None } else { Some(name) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

// -- Outbound --

#[derive(Debug, Clone, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<&'a ReplyKeyboardMarkup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    #[serde(default)]
    pub resize_keyboard: bool,
}

impl ReplyKeyboardMarkup {
    /// One button per row, in the given order.
    pub fn single_column<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keyboard: labels
                .into_iter()
                .map(|l| vec![KeyboardButton { text: l.into() }])
                .collect(),
            resize_keyboard: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyboardButton {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetWebhook<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<&'a str>,
}

/// Envelope every Bot API method answers with.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookInfo {
    pub url: String,
    #[serde(default)]
    pub has_custom_certificate: bool,
    #[serde(default)]
    pub pending_update_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start_command_update() {
        let raw = r#"{
            "update_id": 10,
            "message": {
                "message_id": 1,
                "from": {"id": 42, "is_bot": false, "first_name": "Amal", "language_code": "ar"},
                "chat": {"id": 42, "type": "private"},
                "date": 1700000000,
                "text": "/start@herald_bot ref"
            }
        }"#;

        let update: Update = serde_json::from_str(raw).unwrap();
        let sender = update.sender().unwrap();
        assert_eq!(sender.id, 42);
        assert_eq!(sender.first_name, "Amal");
        assert_eq!(update.message().unwrap().command(), Some("start"));
    }

    #[test]
    fn plain_text_is_not_a_command() {
        let msg = Message {
            message_id: 1,
            from: None,
            chat: Chat { id: 1, kind: "private".into() },
            date: 0,
            text: Some("hello /start".into()),
        };
        assert_eq!(msg.command(), None);
    }

    #[test]
    fn update_without_message_has_no_sender() {
        let update: Update = serde_json::from_str(r#"{"update_id": 3}"#).unwrap();
        assert!(update.sender().is_none());
    }

    #[test]
    fn error_envelope_carries_retry_after() {
        let raw = r#"{"ok":false,"error_code":429,"description":"Too Many Requests: retry after 5","parameters":{"retry_after":5}}"#;
        let resp: ApiResponse<serde_json::Value> = serde_json::from_str(raw).unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.error_code, Some(429));
        assert_eq!(resp.parameters.unwrap().retry_after, Some(5));
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use herald_broadcast::{HandlerError, UpdateHandler};
use herald_types::telegram::{ReplyKeyboardMarkup, Update};

use crate::client::BotApi;

/// Reply texts and the main menu.
#[derive(Debug, Clone)]
pub struct BotTexts {
    pub greeting: String,
    pub placeholder: String,
    pub menu: Vec<String>,
}

impl Default for BotTexts {
    fn default() -> Self {
        Self {
            greeting: "🎓 أهلاً بك في بوت أصول الدين".into(),
            placeholder: "📚 سيتم إضافة المحتوى قريباً".into(),
            menu: vec![
                "السنة الأولى".into(),
                "السنة الثانية".into(),
                "السنة الثالثة".into(),
                "السنة الرابعة".into(),
            ],
        }
    }
}

/// `/start` answers with the greeting and the menu keyboard; any other
/// plain text gets the placeholder. Other commands and non-text updates
/// are ignored.
pub struct BotCommands {
    api: Arc<BotApi>,
    texts: BotTexts,
    keyboard: ReplyKeyboardMarkup,
}

impl BotCommands {
    pub fn new(api: Arc<BotApi>, texts: BotTexts) -> Self {
        let keyboard = ReplyKeyboardMarkup::single_column(texts.menu.iter().cloned());
        Self { api, texts, keyboard }
    }
}

#[async_trait]
impl UpdateHandler for BotCommands {
    async fn handle(&self, update: &Update) -> Result<(), HandlerError> {
        let Some(message) = update.message() else {
            return Ok(());
        };
        if message.text.is_none() {
            return Ok(());
        }

        let chat_id = message.chat.id;
        match message.command() {
            Some("start") => {
                self.api
                    .send_message(chat_id, &self.texts.greeting, Some(&self.keyboard))
                    .await?;
            }
            Some(other) => debug!(command = other, "Ignoring unknown command"),
            None => {
                self.api
                    .send_message(chat_id, &self.texts.placeholder, None)
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use herald_types::telegram::{Chat, Message, User};

    use crate::client::tests::fake_bot_api;

    fn update(text: Option<&str>) -> Update {
        Update {
            update_id: 1,
            message: Some(Message {
                message_id: 1,
                from: Some(User {
                    id: 77,
                    is_bot: false,
                    first_name: "Yusuf".into(),
                    last_name: None,
                    username: None,
                }),
                chat: Chat { id: 77, kind: "private".into() },
                date: 0,
                text: text.map(String::from),
            }),
            edited_message: None,
        }
    }

    async fn commands() -> (BotCommands, crate::client::tests::Requests) {
        let (url, requests) = fake_bot_api().await;
        let api = Arc::new(BotApi::new(&url, "1:t").unwrap());
        (BotCommands::new(api, BotTexts::default()), requests)
    }

    #[tokio::test]
    async fn start_sends_greeting_with_menu() {
        let (cmds, requests) = commands().await;

        cmds.handle(&update(Some("/start"))).await.unwrap();

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let body = &requests[0].1;
        assert_eq!(body["chat_id"], 77);
        assert_eq!(body["text"], BotTexts::default().greeting);
        let rows = body["reply_markup"]["keyboard"].as_array().unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(body["reply_markup"]["resize_keyboard"], true);
    }

    #[tokio::test]
    async fn plain_text_gets_placeholder() {
        let (cmds, requests) = commands().await;

        cmds.handle(&update(Some("السنة الأولى"))).await.unwrap();

        let requests = requests.lock().unwrap();
        assert_eq!(requests[0].1["text"], BotTexts::default().placeholder);
    }

    #[tokio::test]
    async fn unknown_command_and_empty_updates_are_ignored() {
        let (cmds, requests) = commands().await;

        cmds.handle(&update(Some("/help"))).await.unwrap();
        cmds.handle(&update(None)).await.unwrap();
        cmds.handle(&Update { update_id: 2, message: None, edited_message: None })
            .await
            .unwrap();

        assert!(requests.lock().unwrap().is_empty());
    }
}

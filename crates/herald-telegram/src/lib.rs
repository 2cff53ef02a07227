//! Telegram Bot API adapter: outbound delivery, webhook management and
//! the bot's command replies.

pub mod client;
pub mod commands;
pub mod error;

pub use client::BotApi;
pub use commands::{BotCommands, BotTexts};
pub use error::TelegramError;

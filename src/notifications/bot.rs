//! Inbound Telegram webhook handling: bot commands and inline-keyboard callbacks.

use chrono::Utc;
use sea_orm::{DatabaseConnection, DbErr};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use super::message::{self, escape_markdown_v2};
use super::senders::{InlineKeyboardButton, InlineKeyboardMarkup, SenderError, TelegramApi};
use crate::db::entities::bazar_status;
use crate::db::enums::ReachabilityStatus;
use crate::db::services::bazar_service;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Telegram error: {0}")]
    Sender(#[from] SenderError),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub data: Option<String>,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Help,
    List,
    Status,
}

/// `/list@my_bot` and `/LIST extra words` both parse as `/list`. Anything unrecognised
/// gets the help text.
fn parse_command(text: &str) -> Command {
    let first = text.split_whitespace().next().unwrap_or_default();
    let name = first.split('@').next().unwrap_or_default().to_lowercase();
    match name.as_str() {
        "/list" => Command::List,
        "/status" => Command::Status,
        _ => Command::Help,
    }
}

fn help_text() -> String {
    [
        format!("🤖 *{}*", escape_markdown_v2("Bazar monitoring bot")),
        String::new(),
        escape_markdown_v2("/list - bazars with notifications enabled"),
        escape_markdown_v2("/status - current status summary"),
        escape_markdown_v2("/help - this message"),
    ]
    .join("\n")
}

fn list_view(bazars: &[bazar_status::Model]) -> (String, InlineKeyboardMarkup) {
    let text = if bazars.is_empty() {
        escape_markdown_v2("No bazars with notifications enabled.")
    } else {
        format!("📋 *{}*", escape_markdown_v2("Select a bazar:"))
    };

    let inline_keyboard = bazars
        .iter()
        .map(|bazar| {
            let icon = match (bazar.status, bazar.last_offline_cameras_count) {
                (ReachabilityStatus::Offline, _) => "🔴",
                (ReachabilityStatus::Online, 0) => "🟢",
                (ReachabilityStatus::Online, _) => "🟠",
            };
            vec![InlineKeyboardButton {
                text: format!("{icon} {}", bazar.bazar_name),
                callback_data: format!("bazar:{}", bazar.id),
            }]
        })
        .collect();

    (text, InlineKeyboardMarkup { inline_keyboard })
}

fn back_to_list_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton {
            text: "⬅️ Back".to_string(),
            callback_data: "list".to_string(),
        }]],
    }
}

pub struct BotCommandHandler {
    db: DatabaseConnection,
    telegram: Arc<dyn TelegramApi>,
}

impl BotCommandHandler {
    pub fn new(db: DatabaseConnection, telegram: Arc<dyn TelegramApi>) -> Self {
        Self { db, telegram }
    }

    pub async fn handle_update(&self, update: Update) -> Result<(), BotError> {
        if let Some(callback) = update.callback_query {
            return self.handle_callback(callback).await;
        }
        if let Some(message) = update.message {
            let Some(text) = message.text.as_deref() else {
                debug!(update_id = update.update_id, "Ignoring message without text.");
                return Ok(());
            };
            return self.handle_command(message.chat.id, text).await;
        }
        debug!(update_id = update.update_id, "Ignoring unsupported update.");
        Ok(())
    }

    async fn handle_command(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        let chat_id = chat_id.to_string();
        let command = parse_command(text);
        info!(chat_id = %chat_id, command = ?command, "Handling bot command.");

        match command {
            Command::Help => {
                self.telegram.send_message(&chat_id, &help_text(), None).await?;
            }
            Command::List => {
                let bazars = bazar_service::get_notification_enabled_bazars(&self.db).await?;
                let (text, keyboard) = list_view(&bazars);
                self.telegram
                    .send_message(&chat_id, &text, Some(&keyboard))
                    .await?;
            }
            Command::Status => {
                let bazars = bazar_service::get_notification_enabled_bazars(&self.db).await?;
                let text = message::format_status_summary(&bazars, Utc::now());
                self.telegram.send_message(&chat_id, &text, None).await?;
            }
        }
        Ok(())
    }

    async fn handle_callback(&self, callback: CallbackQuery) -> Result<(), BotError> {
        self.telegram.answer_callback_query(&callback.id).await?;

        let (Some(data), Some(message)) = (callback.data.as_deref(), callback.message.as_ref())
        else {
            return Ok(());
        };
        let chat_id = message.chat.id.to_string();

        if data == "list" {
            let bazars = bazar_service::get_notification_enabled_bazars(&self.db).await?;
            let (text, keyboard) = list_view(&bazars);
            self.telegram
                .edit_message_text(&chat_id, message.message_id, &text, Some(&keyboard))
                .await?;
            return Ok(());
        }

        if let Some(bazar_id) = data.strip_prefix("bazar:").and_then(|id| id.parse::<i32>().ok()) {
            let text = match bazar_service::get_bazar_by_id(&self.db, bazar_id).await? {
                Some(bazar) => message::format_bazar_details(&bazar, Utc::now()),
                None => escape_markdown_v2("This bazar no longer exists."),
            };
            self.telegram
                .edit_message_text(
                    &chat_id,
                    message.message_id,
                    &text,
                    Some(&back_to_list_keyboard()),
                )
                .await?;
            return Ok(());
        }

        debug!(data, "Ignoring unknown callback data.");
        Ok(())
    }
}

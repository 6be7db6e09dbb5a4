use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod telegram;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Telegram API error {code}: {description}")]
    Api { code: i64, description: String },
    #[error("Message to delete was not found")]
    MessageNotFound,
    #[error("Chat was migrated to {new_chat_id}")]
    ChatMigrated { new_chat_id: i64 },
    #[error("Invalid response from Telegram: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

/// The subset of the Telegram Bot API used by the notifier and the bot webhook.
///
/// Text is always sent with `parse_mode = MarkdownV2`; callers escape it beforehand.
#[async_trait]
pub trait TelegramApi: Send + Sync {
    /// Sends a message and returns its `message_id`.
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<i64, SenderError>;

    /// Deletes a message. A message that no longer exists yields
    /// [`SenderError::MessageNotFound`].
    async fn delete_message(&self, chat_id: &str, message_id: i64) -> Result<(), SenderError>;

    async fn edit_message_text(
        &self,
        chat_id: &str,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), SenderError>;

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), SenderError>;
}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{InlineKeyboardMarkup, SenderError, TelegramApi};

/// Pushes messages through the Telegram Bot API.
pub struct TelegramSender {
    client: Client,
    api_base: String,
    bot_token: String,
}

impl TelegramSender {
    pub fn new(api_base: &str, bot_token: &str, timeout: Duration) -> Result<Self, SenderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    /// Calls a Bot API method and returns its `result` field.
    async fn call<P: Serialize + ?Sized>(
        &self,
        method: &str,
        payload: &P,
    ) -> Result<Value, SenderError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed: TelegramResponse = serde_json::from_str(&body).map_err(|e| {
            SenderError::InvalidResponse(format!("HTTP {status}: {e}. Body: {body}"))
        })?;

        if parsed.ok {
            debug!(method, "Telegram API call succeeded.");
            return parsed
                .result
                .ok_or_else(|| SenderError::InvalidResponse(format!("{method}: missing result")));
        }

        if let Some(new_chat_id) = parsed.parameters.and_then(|p| p.migrate_to_chat_id) {
            return Err(SenderError::ChatMigrated { new_chat_id });
        }
        let description = parsed.description.unwrap_or_default();
        if description.to_lowercase().contains("message to delete not found") {
            return Err(SenderError::MessageNotFound);
        }
        Err(SenderError::Api {
            code: parsed.error_code.unwrap_or_else(|| i64::from(status.as_u16())),
            description,
        })
    }
}

#[derive(Deserialize)]
struct TelegramResponse {
    ok: bool,
    result: Option<Value>,
    error_code: Option<i64>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Deserialize)]
struct ResponseParameters {
    migrate_to_chat_id: Option<i64>,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct DeleteMessage<'a> {
    chat_id: &'a str,
    message_id: i64,
}

#[derive(Serialize)]
struct EditMessageText<'a> {
    chat_id: &'a str,
    message_id: i64,
    text: &'a str,
    parse_mode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct AnswerCallbackQuery<'a> {
    callback_query_id: &'a str,
}

#[async_trait]
impl TelegramApi for TelegramSender {
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<i64, SenderError> {
        let payload = SendMessage {
            chat_id,
            text,
            parse_mode: "MarkdownV2",
            reply_markup: keyboard,
        };
        let result = self.call("sendMessage", &payload).await?;
        result
            .get("message_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| SenderError::InvalidResponse("sendMessage: missing message_id".into()))
    }

    async fn delete_message(&self, chat_id: &str, message_id: i64) -> Result<(), SenderError> {
        let payload = DeleteMessage {
            chat_id,
            message_id,
        };
        self.call("deleteMessage", &payload).await.map(|_| ())
    }

    async fn edit_message_text(
        &self,
        chat_id: &str,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), SenderError> {
        let payload = EditMessageText {
            chat_id,
            message_id,
            text,
            parse_mode: "MarkdownV2",
            reply_markup: keyboard,
        };
        match self.call("editMessageText", &payload).await {
            Err(SenderError::Api { description, .. })
                if description.contains("message is not modified") =>
            {
                Ok(())
            }
            other => other.map(|_| ()),
        }
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), SenderError> {
        let payload = AnswerCallbackQuery { callback_query_id };
        self.call("answerCallbackQuery", &payload).await.map(|_| ())
    }
}

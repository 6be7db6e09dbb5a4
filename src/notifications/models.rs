use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::entities::telegram_chat;
use crate::db::enums::ChatType;

/// API request body for registering a new recipient chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChatRequest {
    pub chat_id: String,
    #[serde(default = "default_chat_type")]
    pub chat_type: ChatType,
    pub description: Option<String>,
    pub allowed_regions: Option<Vec<String>>,
    pub enabled: Option<bool>,
}

fn default_chat_type() -> ChatType {
    ChatType::Channel
}

/// API request body for updating an existing recipient. Absent fields stay unchanged;
/// an empty `allowed_regions` list clears the filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateChatRequest {
    pub chat_type: Option<ChatType>,
    pub description: Option<String>,
    pub allowed_regions: Option<Vec<String>>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: i32,
    pub chat_id: String,
    pub chat_type: ChatType,
    pub description: Option<String>,
    pub allowed_regions: Vec<String>,
    pub enabled: bool,
    pub last_message_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<telegram_chat::Model> for ChatResponse {
    fn from(chat: telegram_chat::Model) -> Self {
        let allowed_regions = chat.allowed_regions();
        Self {
            id: chat.id,
            chat_id: chat.chat_id,
            chat_type: chat.chat_type,
            description: chat.description,
            allowed_regions,
            enabled: chat.enabled,
            last_message_id: chat.last_message_id,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
        }
    }
}

/// A per-recipient delivery failure recorded during fan-out.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryFailure {
    pub chat_id: String,
    pub chat_type: ChatType,
    pub reason: String,
}

/// Result of delivering one message to every eligible recipient.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FanOutReport {
    pub sent: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl FanOutReport {
    pub fn is_success(&self) -> bool {
        self.sent > 0
    }
}

//! Notification recipients (Telegram chats) and their delivery bookkeeping.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use thiserror::Error;

use crate::db::entities::{prelude::*, telegram_chat};
use crate::notifications::models::{CreateChatRequest, UpdateChatRequest};

#[derive(Error, Debug)]
pub enum RecipientError {
    #[error("Invalid chat id '{0}': only numeric chat ids are supported")]
    InvalidChatId(String),
    #[error("Chat id {0} is already registered")]
    Duplicate(String),
    #[error("Recipient not found: {0}")]
    NotFound(i32),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Telegram chat ids are signed integers; `@username` handles are rejected.
pub fn is_valid_chat_id(chat_id: &str) -> bool {
    let digits = chat_id.strip_prefix('-').unwrap_or(chat_id);
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && chat_id.parse::<i64>().is_ok()
}

fn regions_to_json(regions: Option<Vec<String>>) -> Option<serde_json::Value> {
    regions
        .map(|list| {
            list.into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|list| !list.is_empty())
        .map(|list| serde_json::json!(list))
}

pub async fn get_all_chats<C: ConnectionTrait>(db: &C) -> Result<Vec<telegram_chat::Model>, DbErr> {
    TelegramChat::find()
        .order_by_asc(telegram_chat::Column::Id)
        .all(db)
        .await
}

pub async fn get_enabled_chats<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<telegram_chat::Model>, DbErr> {
    TelegramChat::find()
        .filter(telegram_chat::Column::Enabled.eq(true))
        .order_by_asc(telegram_chat::Column::Id)
        .all(db)
        .await
}

pub async fn get_chat_by_id<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<telegram_chat::Model>, DbErr> {
    TelegramChat::find_by_id(id).one(db).await
}

pub async fn create_chat<C: ConnectionTrait>(
    db: &C,
    payload: CreateChatRequest,
) -> Result<telegram_chat::Model, RecipientError> {
    let chat_id = payload.chat_id.trim().to_string();
    if !is_valid_chat_id(&chat_id) {
        return Err(RecipientError::InvalidChatId(chat_id));
    }

    let existing = TelegramChat::find()
        .filter(telegram_chat::Column::ChatId.eq(chat_id.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(RecipientError::Duplicate(chat_id));
    }

    let now = Utc::now();
    let chat = telegram_chat::ActiveModel {
        chat_id: Set(chat_id),
        chat_type: Set(payload.chat_type),
        description: Set(payload.description.filter(|d| !d.trim().is_empty())),
        allowed_regions: Set(regions_to_json(payload.allowed_regions)),
        enabled: Set(payload.enabled.unwrap_or(true)),
        last_message_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(chat.insert(db).await?)
}

/// Applies a partial update. The returned flag is true when the recipient went from
/// disabled to enabled.
pub async fn update_chat<C: ConnectionTrait>(
    db: &C,
    id: i32,
    payload: UpdateChatRequest,
) -> Result<(telegram_chat::Model, bool), RecipientError> {
    let chat = TelegramChat::find_by_id(id)
        .one(db)
        .await?
        .ok_or(RecipientError::NotFound(id))?;
    let was_enabled = chat.enabled;

    let mut active: telegram_chat::ActiveModel = chat.into();
    if let Some(chat_type) = payload.chat_type {
        active.chat_type = Set(chat_type);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description).filter(|d| !d.trim().is_empty()));
    }
    if let Some(regions) = payload.allowed_regions {
        active.allowed_regions = Set(regions_to_json(Some(regions)));
    }
    if let Some(enabled) = payload.enabled {
        active.enabled = Set(enabled);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(db).await?;
    let re_enabled = !was_enabled && updated.enabled;
    Ok((updated, re_enabled))
}

pub async fn delete_chat<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), RecipientError> {
    let result = TelegramChat::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(RecipientError::NotFound(id));
    }
    Ok(())
}

pub async fn set_last_message_id<C: ConnectionTrait>(
    db: &C,
    id: i32,
    message_id: Option<i64>,
) -> Result<(), DbErr> {
    TelegramChat::update_many()
        .col_expr(telegram_chat::Column::LastMessageId, Expr::value(message_id))
        .col_expr(telegram_chat::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(telegram_chat::Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(())
}

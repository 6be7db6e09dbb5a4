use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    db::entities::telegram_chat,
    db::services::telegram_chat_service,
    notifications::bot::Update,
    notifications::models::{ChatResponse, CreateChatRequest, UpdateChatRequest},
    web::{AppError, AppState},
};

pub fn create_telegram_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat-ids", get(get_all_chats).post(create_chat))
        .route("/chat-ids/{id}", put(update_chat).delete(delete_chat))
        .route("/test", post(send_test_message))
        .route("/webhook", post(handle_webhook))
}

/// Pushes the current snapshot to a recipient that just became active. Delivery problems
/// are logged; they never fail the administrative request.
async fn push_snapshot(app_state: &AppState, chat: &telegram_chat::Model) -> bool {
    match app_state.notification_service.push_snapshot(chat).await {
        Ok(delivered) => delivered,
        Err(e) => {
            warn!(chat_id = %chat.chat_id, error = %e, "Snapshot push skipped.");
            false
        }
    }
}

async fn get_all_chats(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let chats: Vec<ChatResponse> = telegram_chat_service::get_all_chats(&app_state.db)
        .await?
        .into_iter()
        .map(ChatResponse::from)
        .collect();
    Ok(Json(json!({ "success": true, "total": chats.len(), "data": chats })))
}

async fn create_chat(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    let chat = telegram_chat_service::create_chat(&app_state.db, payload).await?;
    info!(chat_id = %chat.chat_id, chat_type = %chat.chat_type, "Telegram recipient added.");

    let snapshot_sent = if chat.enabled {
        push_snapshot(&app_state, &chat).await
    } else {
        false
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": ChatResponse::from(chat),
            "snapshot_sent": snapshot_sent,
        })),
    ))
}

async fn update_chat(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateChatRequest>,
) -> Result<Json<Value>, AppError> {
    let (chat, re_enabled) = telegram_chat_service::update_chat(&app_state.db, id, payload).await?;

    let snapshot_sent = if re_enabled {
        push_snapshot(&app_state, &chat).await
    } else {
        false
    };

    Ok(Json(json!({
        "success": true,
        "data": ChatResponse::from(chat),
        "snapshot_sent": snapshot_sent,
    })))
}

async fn delete_chat(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    telegram_chat_service::delete_chat(&app_state.db, id).await?;
    info!(recipient_id = id, "Telegram recipient deleted.");
    Ok(Json(json!({ "success": true })))
}

async fn send_test_message(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let report = app_state.notification_service.send_test_message().await?;
    Ok(Json(json!({
        "success": report.is_success(),
        "sent": report.sent,
        "failures": report.failures,
    })))
}

// Always answers 200 so Telegram does not redeliver updates we failed to handle.
async fn handle_webhook(
    State(app_state): State<Arc<AppState>>,
    Json(update): Json<Update>,
) -> Json<Value> {
    let Some(bot) = app_state.bot.as_ref() else {
        warn!(
            update_id = update.update_id,
            "Webhook update received but no bot token is configured."
        );
        return Json(json!({ "ok": false }));
    };
    let update_id = update.update_id;
    if let Err(e) = bot.handle_update(update).await {
        error!(update_id, error = %e, "Failed to handle Telegram update.");
    }
    Json(json!({ "ok": true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::enums::ChatType;
    use crate::test_support::{
        RecordingTelegram, StaticProber, TelegramCall, app_state, setup_db,
    };

    async fn test_state() -> (Arc<AppState>, Arc<RecordingTelegram>) {
        let db = setup_db().await;
        app_state(&db, Arc::new(StaticProber { statistics: None }))
    }

    fn request(chat_id: &str, enabled: bool) -> CreateChatRequest {
        CreateChatRequest {
            chat_id: chat_id.to_string(),
            chat_type: ChatType::User,
            description: None,
            allowed_regions: None,
            enabled: Some(enabled),
        }
    }

    #[tokio::test]
    async fn creating_enabled_recipient_pushes_snapshot() {
        let (state, fake) = test_state().await;

        let response = create_chat(State(state.clone()), Json(request("12345", true)))
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let sends = fake.sends();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].0, "12345");
    }

    #[tokio::test]
    async fn symbolic_chat_id_is_rejected() {
        let (state, fake) = test_state().await;
        let result = create_chat(State(state), Json(request("@ops_channel", true))).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn re_enabling_pushes_snapshot_once() {
        let (state, fake) = test_state().await;
        let chat = telegram_chat_service::create_chat(&state.db, request("777", false))
            .await
            .unwrap();

        let _response = update_chat(
            State(state.clone()),
            Path(chat.id),
            Json(UpdateChatRequest {
                enabled: Some(true),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        let _response = update_chat(
            State(state.clone()),
            Path(chat.id),
            Json(UpdateChatRequest {
                description: Some("still enabled".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(fake.sends().len(), 1);
    }

    #[tokio::test]
    async fn webhook_dispatches_to_bot() {
        let (state, fake) = test_state().await;
        let update: Update = serde_json::from_value(json!({
            "update_id": 5,
            "message": { "message_id": 1, "chat": { "id": 42 }, "text": "/start" }
        }))
        .unwrap();

        let Json(body) = handle_webhook(State(state), Json(update)).await;
        assert_eq!(body["ok"], true);
        assert!(matches!(
            fake.calls().first(),
            Some(TelegramCall::Send { chat_id, .. }) if chat_id == "42"
        ));
    }
}

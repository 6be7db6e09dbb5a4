use axum::{
    Json, Router,
    extract::{Path, State},
    routing::put,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use crate::{
    db::services::bazar_service,
    web::{
        AppError, AppState,
        models::bazar_models::{BazarView, ToggleNotificationsRequest},
    },
};

/// Shortest reminder interval accepted from the API, in seconds.
const MIN_CHECK_INTERVAL_SECONDS: i32 = 60;

pub fn create_service_router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/{id}/telegram-notifications",
        put(toggle_telegram_notifications),
    )
}

async fn toggle_telegram_notifications(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<ToggleNotificationsRequest>,
) -> Result<Json<Value>, AppError> {
    if let Some(interval) = payload.check_interval {
        if interval < MIN_CHECK_INTERVAL_SECONDS {
            return Err(AppError::InvalidInput(format!(
                "check_interval must be at least {MIN_CHECK_INTERVAL_SECONDS} seconds"
            )));
        }
    }

    let (bazar, newly_enabled) = bazar_service::set_notifications_enabled(
        &app_state.db,
        id,
        payload.enabled,
        payload.check_interval,
    )
    .await?;
    info!(
        bazar_id = id,
        enabled = payload.enabled,
        newly_enabled,
        "Telegram notifications toggled."
    );

    let mut notified = None;
    if newly_enabled {
        notified = app_state.pipeline.push_current_status(&bazar).await?;
    }

    // Re-read so the response carries the count recorded by the push.
    let bazar = bazar_service::get_bazar_by_id(&app_state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("bazar {id}")))?;

    Ok(Json(json!({
        "success": true,
        "data": BazarView::from(bazar),
        "notified": notified,
    })))
}

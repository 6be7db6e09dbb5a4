use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use std::sync::Arc;

use crate::{
    db::services::log_service,
    web::{
        AppError, AppState,
        models::bazar_models::{ListResponse, LogView, LogsQuery},
    },
};

const DEFAULT_LOG_LIMIT: u64 = 100;
const DEFAULT_BAZAR_LOG_LIMIT: u64 = 50;
const MAX_LOG_LIMIT: u64 = 1000;

pub fn create_log_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/logs", get(get_logs))
        .route("/logs/{ip}/{port}", get(get_bazar_logs))
}

async fn get_logs(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<ListResponse<LogView>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).min(MAX_LOG_LIMIT);
    let status = query.status.as_deref().filter(|s| !s.is_empty());
    let logs = log_service::get_logs(&app_state.db, limit, status).await?;
    Ok(Json(ListResponse::new(
        logs.into_iter().map(LogView::from).collect(),
    )))
}

async fn get_bazar_logs(
    State(app_state): State<Arc<AppState>>,
    Path((ip, port)): Path<(String, i32)>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<ListResponse<LogView>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_BAZAR_LOG_LIMIT).min(MAX_LOG_LIMIT);
    let logs = log_service::get_logs_for_bazar(&app_state.db, &ip, port, limit).await?;
    Ok(Json(ListResponse::new(
        logs.into_iter().map(LogView::from).collect(),
    )))
}

use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::{
    db::enums::ReachabilityStatus,
    db::services::{bazar_service, log_service},
    web::{
        AppError, AppState,
        models::bazar_models::{BazarView, ListResponse, LogView, StatisticsView},
    },
};

pub fn create_bazar_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bazars", get(poll_bazars))
        .route("/status", get(get_status))
        .route("/statistics", get(get_statistics))
}

// Probes every bazar now and records the outcomes
async fn poll_bazars(State(app_state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let results = app_state.pipeline.poll_all().await?;
    let online = results
        .iter()
        .filter(|r| r.status == ReachabilityStatus::Online)
        .count();
    let total = results.len();

    let mut body = json!({
        "success": true,
        "data": results,
        "total": total,
        "online": online,
        "offline": total - online,
    });
    if total == 0 {
        body["message"] = json!("No bazars registered yet.");
    }
    Ok(Json(body))
}

async fn get_status(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<ListResponse<BazarView>>, AppError> {
    let bazars = bazar_service::get_all_bazars(&app_state.db).await?;
    Ok(Json(ListResponse::new(
        bazars.into_iter().map(BazarView::from).collect(),
    )))
}

async fn get_statistics(State(app_state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let counts = bazar_service::get_status_counts(&app_state.db).await?;
    let recent_changes = log_service::get_logs(&app_state.db, 10, None).await?;
    let problem_count = log_service::count_problem_bazars(&app_state.db).await?;

    let uptime_percentage = if counts.total > 0 {
        counts.online as f64 / counts.total as f64 * 100.0
    } else {
        0.0
    };

    let statistics = StatisticsView {
        total: counts.total,
        online: counts.online,
        offline: counts.offline,
        uptime_percentage,
        recent_changes: recent_changes.into_iter().map(LogView::from).collect(),
        problem_count,
    };
    Ok(Json(json!({ "success": true, "data": statistics })))
}

use axum::{Json, Router, http::Method, routing::get};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::monitoring::pipeline::MonitoringPipeline;
use crate::notifications::bot::BotCommandHandler;
use crate::notifications::service::NotificationService;

pub use error::AppError;

pub mod error;
pub mod models;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub pipeline: Arc<MonitoringPipeline>,
    pub notification_service: Arc<NotificationService>,
    /// Absent when no bot token is configured.
    pub bot: Option<Arc<BotCommandHandler>>,
}

async fn health_check_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "message": "Bazar Monitoring API is running",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub fn create_axum_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(health_check_handler))
        .merge(routes::bazar_routes::create_bazar_router())
        .merge(routes::log_routes::create_log_router())
        .nest("/services", routes::service_routes::create_service_router())
        .nest("/telegram", routes::telegram_routes::create_telegram_router());

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state)
}

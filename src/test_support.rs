//! Fixtures shared by the unit tests: an in-memory database, target rows and a
//! recording Telegram fake.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use std::collections::HashSet;
use serde_json::Value;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::db::entities::bazar_status;
use crate::db::enums::ReachabilityStatus;
use crate::alerting::evaluation_service::EvaluationService;
use crate::db::schema::ensure_schema;
use crate::monitoring::pipeline::MonitoringPipeline;
use crate::monitoring::prober::{ProbeKind, ProbeOutcome, Prober};
use crate::notifications::bot::BotCommandHandler;
use crate::notifications::senders::{InlineKeyboardMarkup, SenderError, TelegramApi};
use crate::notifications::service::NotificationService;
use crate::web::AppState;

pub async fn setup_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("connect in-memory sqlite");
    ensure_schema(&db).await.expect("create schema");
    db
}

/// An unsaved target with monitoring defaults, for tests that only need a model.
pub fn bazar_model(id: i32, name: &str, city: Option<&str>) -> bazar_status::Model {
    bazar_status::Model {
        id,
        bazar_name: name.to_string(),
        bazar_ip: format!("10.0.0.{id}"),
        bazar_port: 8080,
        backend_port: 8000,
        pg_port: 5432,
        city: city.map(str::to_string),
        status: ReachabilityStatus::Online,
        last_online: None,
        last_offline: None,
        last_check: Utc::now(),
        uptime_percentage: 100.0,
        contact_click: None,
        contact_click_name: None,
        contact_scc: None,
        contact_scc_name: None,
        latitude: None,
        longitude: None,
        telegram_notifications_enabled: true,
        notification_check_interval: 3600,
        last_offline_cameras_count: 0,
        last_notification_time: None,
    }
}

/// Inserts a target as an administrator would: offline, notifications disabled.
pub async fn insert_bazar(
    db: &DatabaseConnection,
    name: &str,
    ip: &str,
    port: i32,
    city: Option<&str>,
) -> bazar_status::Model {
    bazar_status::ActiveModel {
        bazar_name: Set(name.to_string()),
        bazar_ip: Set(ip.to_string()),
        bazar_port: Set(port),
        backend_port: Set(8000),
        pg_port: Set(5432),
        city: Set(city.map(str::to_string)),
        status: Set(ReachabilityStatus::Offline),
        last_online: Set(None),
        last_offline: Set(None),
        last_check: Set(Utc::now()),
        uptime_percentage: Set(0.0),
        contact_click: Set(None),
        contact_click_name: Set(None),
        contact_scc: Set(None),
        contact_scc_name: Set(None),
        latitude: Set(None),
        longitude: Set(None),
        telegram_notifications_enabled: Set(false),
        notification_check_interval: Set(3600),
        last_offline_cameras_count: Set(0),
        last_notification_time: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert bazar")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelegramCall {
    Send {
        chat_id: String,
        text: String,
        message_id: i64,
    },
    Delete {
        chat_id: String,
        message_id: i64,
    },
    Edit {
        chat_id: String,
        message_id: i64,
        text: String,
    },
    AnswerCallback {
        callback_query_id: String,
    },
}

/// Records every Bot API call in order. Sends return increasing message ids starting at 1000.
#[derive(Default)]
pub struct RecordingTelegram {
    calls: Mutex<Vec<TelegramCall>>,
    next_message_id: AtomicI64,
    failing_chats: Mutex<HashSet<String>>,
    missing_messages: Mutex<HashSet<i64>>,
    latency: Duration,
}

impl RecordingTelegram {
    pub fn new() -> Self {
        Self {
            next_message_id: AtomicI64::new(1000),
            ..Default::default()
        }
    }

    /// Delays every send and delete, so concurrent callers interleave unless serialised.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes every send to `chat_id` fail with a 403.
    pub fn fail_sends_to(&self, chat_id: &str) {
        self.failing_chats.lock().unwrap().insert(chat_id.to_string());
    }

    /// Makes deleting `message_id` report "message to delete not found".
    pub fn forget_message(&self, message_id: i64) {
        self.missing_messages.lock().unwrap().insert(message_id);
    }

    pub fn calls(&self) -> Vec<TelegramCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sends(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TelegramCall::Send { chat_id, text, .. } => Some((chat_id, text)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: TelegramCall) {
        self.calls.lock().unwrap().push(call);
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl TelegramApi for RecordingTelegram {
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        _keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<i64, SenderError> {
        self.simulate_latency().await;
        if self.failing_chats.lock().unwrap().contains(chat_id) {
            return Err(SenderError::Api {
                code: 403,
                description: "Forbidden: bot was blocked by the user".to_string(),
            });
        }
        let message_id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        self.record(TelegramCall::Send {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            message_id,
        });
        Ok(message_id)
    }

    async fn delete_message(&self, chat_id: &str, message_id: i64) -> Result<(), SenderError> {
        self.simulate_latency().await;
        self.record(TelegramCall::Delete {
            chat_id: chat_id.to_string(),
            message_id,
        });
        if self.missing_messages.lock().unwrap().contains(&message_id) {
            return Err(SenderError::MessageNotFound);
        }
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat_id: &str,
        message_id: i64,
        text: &str,
        _keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), SenderError> {
        self.record(TelegramCall::Edit {
            chat_id: chat_id.to_string(),
            message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), SenderError> {
        self.record(TelegramCall::AnswerCallback {
            callback_query_id: callback_query_id.to_string(),
        });
        Ok(())
    }
}

/// Every bazar answers its liveness probe; statistics come from `statistics`, or the
/// statistics endpoint is unreachable when it is `None`.
pub struct StaticProber {
    pub statistics: Option<Value>,
}

#[async_trait]
impl Prober for StaticProber {
    async fn probe(&self, _bazar: &bazar_status::Model, kind: ProbeKind) -> ProbeOutcome {
        match (kind, &self.statistics) {
            (ProbeKind::Liveness, _) => ProbeOutcome::Reachable {
                payload: serde_json::json!({}),
            },
            (ProbeKind::Statistics, Some(payload)) => ProbeOutcome::Reachable {
                payload: payload.clone(),
            },
            (ProbeKind::Statistics, None) => ProbeOutcome::Unreachable {
                reason: "HTTP 404".to_string(),
            },
        }
    }
}

/// Application state wired to `db`, the given prober and a recording Telegram fake.
pub fn app_state(
    db: &DatabaseConnection,
    prober: Arc<dyn Prober>,
) -> (Arc<AppState>, Arc<RecordingTelegram>) {
    let fake = Arc::new(RecordingTelegram::new());
    let api: Arc<dyn TelegramApi> = fake.clone();
    let notification_service = Arc::new(NotificationService::new(db.clone(), Some(api.clone())));
    let evaluation = Arc::new(EvaluationService::new(
        db.clone(),
        notification_service.clone(),
    ));
    let pipeline = Arc::new(MonitoringPipeline::new(db.clone(), prober, evaluation, 1));

    let state = AppState {
        db: db.clone(),
        pipeline,
        notification_service,
        bot: Some(Arc::new(BotCommandHandler::new(db.clone(), api))),
    };
    (Arc::new(state), fake)
}

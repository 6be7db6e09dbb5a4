use chrono::Utc;
use dashmap::DashMap;
use sea_orm::{DatabaseConnection, DbErr};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::message::{self, NotificationKind};
use super::models::{DeliveryFailure, FanOutReport};
use super::region::region_allowed;
use super::senders::{SenderError, TelegramApi};
use crate::db::entities::{bazar_status, telegram_chat};
use crate::db::services::{bazar_service, telegram_chat_service};

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Telegram bot token is not configured")]
    MissingCredential,
    #[error("No enabled recipient is eligible for this notification")]
    NoEligibleRecipients,
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Delivers messages to the registered Telegram recipients.
///
/// Every delivery to one recipient (delete previous message, send, persist new id) runs
/// under that recipient's lock, so overlapping fan-outs cannot interleave their steps.
pub struct NotificationService {
    db: DatabaseConnection,
    telegram: Option<Arc<dyn TelegramApi>>,
    recipient_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl NotificationService {
    pub fn new(db: DatabaseConnection, telegram: Option<Arc<dyn TelegramApi>>) -> Self {
        Self {
            db,
            telegram,
            recipient_locks: DashMap::new(),
        }
    }

    pub fn telegram(&self) -> Result<&Arc<dyn TelegramApi>, NotificationError> {
        self.telegram.as_ref().ok_or(NotificationError::MissingCredential)
    }

    fn recipient_lock(&self, chat_id: &str) -> Arc<Mutex<()>> {
        self.recipient_locks
            .entry(chat_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Sends a camera-health notification about `bazar` to every eligible recipient.
    ///
    /// Per-recipient failures are collected in the report; only a missing credential, an
    /// empty recipient set or a failure to list recipients is returned as an error.
    pub async fn notify(
        &self,
        bazar: &bazar_status::Model,
        offline: i32,
        total: i32,
        kind: NotificationKind,
        next_reminder: Option<Duration>,
    ) -> Result<FanOutReport, NotificationError> {
        let api = self.telegram()?;
        let recipients = self.eligible_recipients(bazar.region()).await?;
        if recipients.is_empty() {
            return Err(NotificationError::NoEligibleRecipients);
        }

        let text = message::format_camera_notification(
            bazar,
            offline,
            total,
            kind,
            next_reminder,
            Utc::now(),
        );

        let mut report = FanOutReport::default();
        for recipient in &recipients {
            match self.deliver_replacing(api.as_ref(), recipient, &text).await {
                Ok(message_id) => {
                    debug!(
                        bazar_id = bazar.id,
                        chat_id = %recipient.chat_id,
                        message_id,
                        "Notification delivered."
                    );
                    report.sent += 1;
                }
                Err(e) => {
                    report_delivery_failure(&mut report, recipient, &e);
                }
            }
        }

        info!(
            bazar_id = bazar.id,
            kind = kind.as_str(),
            sent = report.sent,
            failed = report.failures.len(),
            "Camera notification fan-out finished."
        );
        Ok(report)
    }

    /// Enabled recipients whose allow-list admits `region`, deduplicated by chat id
    /// (later rows win) and restricted to numeric chat ids.
    async fn eligible_recipients(
        &self,
        region: Option<&str>,
    ) -> Result<Vec<telegram_chat::Model>, NotificationError> {
        let chats = telegram_chat_service::get_enabled_chats(&self.db).await?;

        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut eligible: Vec<telegram_chat::Model> = Vec::new();
        for chat in chats {
            if !region_allowed(&chat.allowed_regions(), region) {
                continue;
            }
            if !telegram_chat_service::is_valid_chat_id(&chat.chat_id) {
                warn!(chat_id = %chat.chat_id, "Skipping recipient with a non-numeric chat id.");
                continue;
            }
            match positions.get(&chat.chat_id) {
                Some(&index) => eligible[index] = chat,
                None => {
                    positions.insert(chat.chat_id.clone(), eligible.len());
                    eligible.push(chat);
                }
            }
        }
        Ok(eligible)
    }

    /// Replaces the recipient's previous message with `text` and returns the new message id.
    async fn deliver_replacing(
        &self,
        api: &dyn TelegramApi,
        recipient: &telegram_chat::Model,
        text: &str,
    ) -> Result<i64, SenderError> {
        let lock = self.recipient_lock(&recipient.chat_id);
        let _guard = lock.lock().await;

        // Re-read under the lock: a concurrent fan-out may have replaced the message already.
        let reloaded = telegram_chat_service::get_chat_by_id(&self.db, recipient.id).await;
        let previous_message_id = match reloaded {
            Ok(Some(current)) => current.last_message_id,
            Ok(None) => recipient.last_message_id,
            Err(e) => {
                warn!(
                    chat_id = %recipient.chat_id,
                    error = %e,
                    "Failed to reload recipient; using cached message id."
                );
                recipient.last_message_id
            }
        };

        if let Some(old_id) = previous_message_id {
            match api.delete_message(&recipient.chat_id, old_id).await {
                Ok(()) | Err(SenderError::MessageNotFound) => {}
                Err(e) => {
                    warn!(
                        chat_id = %recipient.chat_id,
                        message_id = old_id,
                        error = %e,
                        "Failed to delete previous message."
                    );
                }
            }
        }

        let message_id = api.send_message(&recipient.chat_id, text, None).await?;

        let stored =
            telegram_chat_service::set_last_message_id(&self.db, recipient.id, Some(message_id))
                .await;
        if let Err(e) = stored {
            error!(
                chat_id = %recipient.chat_id,
                message_id,
                error = %e,
                "Message sent but its id could not be stored."
            );
        }
        Ok(message_id)
    }

    /// Sends a newly created or re-enabled recipient a summary of every notification-enabled
    /// bazar its region filter admits. Returns whether the message was delivered.
    pub async fn push_snapshot(
        &self,
        recipient: &telegram_chat::Model,
    ) -> Result<bool, NotificationError> {
        if !recipient.enabled {
            return Ok(false);
        }
        let api = self.telegram()?;

        let allowed = recipient.allowed_regions();
        let bazars: Vec<bazar_status::Model> =
            bazar_service::get_notification_enabled_bazars(&self.db)
                .await?
                .into_iter()
                .filter(|b| region_allowed(&allowed, b.region()))
                .collect();

        let text = message::format_status_summary(&bazars, Utc::now());
        match self.deliver_replacing(api.as_ref(), recipient, &text).await {
            Ok(_) => {
                info!(
                    chat_id = %recipient.chat_id,
                    bazars = bazars.len(),
                    "Snapshot pushed to recipient."
                );
                Ok(true)
            }
            Err(e) => {
                warn!(
                    chat_id = %recipient.chat_id,
                    error = %e,
                    "Failed to push snapshot to recipient."
                );
                Ok(false)
            }
        }
    }

    /// Sends a test message to every enabled recipient without touching stored message ids.
    pub async fn send_test_message(&self) -> Result<FanOutReport, NotificationError> {
        let api = self.telegram()?;
        let recipients = self.eligible_recipients(None).await?;
        if recipients.is_empty() {
            return Err(NotificationError::NoEligibleRecipients);
        }

        let text = message::format_test_message(Utc::now());
        let mut report = FanOutReport::default();
        for recipient in &recipients {
            match api.send_message(&recipient.chat_id, &text, None).await {
                Ok(_) => report.sent += 1,
                Err(e) => report_delivery_failure(&mut report, recipient, &e),
            }
        }
        Ok(report)
    }
}

fn report_delivery_failure(
    report: &mut FanOutReport,
    recipient: &telegram_chat::Model,
    err: &SenderError,
) {
    match err {
        SenderError::ChatMigrated { new_chat_id } => warn!(
            chat_id = %recipient.chat_id,
            new_chat_id,
            "Chat was migrated; update the recipient to the new chat id."
        ),
        _ => warn!(chat_id = %recipient.chat_id, error = %err, "Failed to deliver notification."),
    }
    report.failures.push(DeliveryFailure {
        chat_id: recipient.chat_id.clone(),
        chat_type: recipient.chat_type,
        reason: err.to_string(),
    });
}

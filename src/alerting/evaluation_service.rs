use chrono::{DateTime, Duration as ChronoDuration, Utc};
use sea_orm::{DatabaseConnection, DbErr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::camera_health::{
    CameraHealthSnapshot, CameraHealthState, NotificationAction, evaluate_transition,
};
use crate::db::entities::bazar_status;
use crate::db::services::bazar_service;
use crate::notifications::message::NotificationKind;
use crate::notifications::service::NotificationService;

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationOutcome {
    /// Notifications are disabled for the bazar.
    Disabled,
    /// The snapshot reported zero cameras.
    NoData,
    Evaluated {
        action: NotificationAction,
        sent: usize,
    },
}

/// Applies the camera-health state machine to persisted bazar state and drives fan-out.
pub struct EvaluationService {
    db: DatabaseConnection,
    notification_service: Arc<NotificationService>,
}

fn reminder_interval(bazar: &bazar_status::Model) -> i64 {
    i64::from(bazar.notification_check_interval.max(0))
}

impl EvaluationService {
    pub fn new(db: DatabaseConnection, notification_service: Arc<NotificationService>) -> Self {
        Self {
            db,
            notification_service,
        }
    }

    /// Evaluates one snapshot for `bazar` as currently persisted.
    ///
    /// The offline count is always written back once any send has finished; the last
    /// notification time only advances when at least one recipient got the message.
    pub async fn evaluate(
        &self,
        bazar: &bazar_status::Model,
        snapshot: &CameraHealthSnapshot,
        now: DateTime<Utc>,
    ) -> Result<EvaluationOutcome, EvaluationError> {
        if !bazar.telegram_notifications_enabled {
            return Ok(EvaluationOutcome::Disabled);
        }
        if !snapshot.has_data() {
            debug!(bazar_id = bazar.id, "Skipping camera evaluation: no cameras reported.");
            return Ok(EvaluationOutcome::NoData);
        }

        let interval_seconds = reminder_interval(bazar);
        let previous = CameraHealthState::from_offline_count(bazar.last_offline_cameras_count);
        let transition = evaluate_transition(
            previous,
            snapshot,
            bazar.last_notification_time,
            ChronoDuration::seconds(interval_seconds),
            now,
        );

        let sent = match transition.action.kind() {
            Some(kind) => {
                let next_reminder = Duration::from_secs(interval_seconds.unsigned_abs());
                self.send(bazar, snapshot, kind, Some(next_reminder)).await
            }
            None => 0,
        };

        bazar_service::update_notification_state(
            &self.db,
            bazar.id,
            snapshot.offline,
            (sent > 0).then_some(now),
        )
        .await?;

        if transition.action != NotificationAction::None {
            info!(
                bazar_id = bazar.id,
                action = ?transition.action,
                offline = snapshot.offline,
                total = snapshot.total,
                sent,
                "Camera health evaluated."
            );
        }
        Ok(EvaluationOutcome::Evaluated {
            action: transition.action,
            sent,
        })
    }

    /// Pushes the current camera status regardless of state, e.g. right after
    /// notifications were enabled, and records the observed offline count.
    pub async fn push_status(
        &self,
        bazar: &bazar_status::Model,
        snapshot: &CameraHealthSnapshot,
        now: DateTime<Utc>,
    ) -> Result<usize, EvaluationError> {
        let sent = self.send(bazar, snapshot, NotificationKind::Status, None).await;
        bazar_service::update_notification_state(
            &self.db,
            bazar.id,
            snapshot.offline,
            (sent > 0).then_some(now),
        )
        .await?;
        Ok(sent)
    }

    async fn send(
        &self,
        bazar: &bazar_status::Model,
        snapshot: &CameraHealthSnapshot,
        kind: NotificationKind,
        next_reminder: Option<Duration>,
    ) -> usize {
        match self
            .notification_service
            .notify(bazar, snapshot.offline, snapshot.total, kind, next_reminder)
            .await
        {
            Ok(report) => report.sent,
            Err(e) => {
                warn!(
                    bazar_id = bazar.id,
                    kind = kind.as_str(),
                    error = %e,
                    "Notification not sent."
                );
                0
            }
        }
    }
}

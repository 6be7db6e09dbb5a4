//! Persists probe outcomes onto the target row and audits reachability changes.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set, TransactionTrait};
use tracing::info;

use super::prober::ProbeOutcome;
use crate::db::entities::{bazar_log, bazar_status, prelude::*};
use crate::db::enums::{LogActionType, ReachabilityStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub previous: ReachabilityStatus,
    pub current: ReachabilityStatus,
}

impl StatusChange {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Applies one probe outcome to a bazar.
///
/// An audit entry is written only when reachability changed. The status, `last_check` and
/// the matching `last_online`/`last_offline` timestamp are always updated. Name and city
/// are administrator-owned and never taken from the probe payload. Both writes share one
/// transaction.
pub async fn record_status(
    db: &DatabaseConnection,
    bazar_id: i32,
    outcome: &ProbeOutcome,
    now: DateTime<Utc>,
) -> Result<StatusChange, DbErr> {
    let txn = db.begin().await?;

    let bazar = BazarStatus::find_by_id(bazar_id)
        .one(&txn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("bazar {bazar_id}")))?;

    let current = if outcome.is_reachable() {
        ReachabilityStatus::Online
    } else {
        ReachabilityStatus::Offline
    };
    let change = StatusChange {
        previous: bazar.status,
        current,
    };

    if change.changed() {
        bazar_log::ActiveModel {
            bazar_name: Set(bazar.bazar_name.clone()),
            bazar_ip: Set(bazar.bazar_ip.clone()),
            bazar_port: Set(bazar.bazar_port),
            city: Set(bazar.city.clone()),
            status: Set(current.to_string()),
            previous_status: Set(Some(change.previous.to_string())),
            error_message: Set(outcome.error_reason().map(str::to_string)),
            action_type: Set(LogActionType::StatusChange),
            action_details: Set(None),
            timestamp: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    let mut active: bazar_status::ActiveModel = bazar.into();
    active.status = Set(current);
    active.last_check = Set(now);
    match current {
        ReachabilityStatus::Online => active.last_online = Set(Some(now)),
        ReachabilityStatus::Offline => active.last_offline = Set(Some(now)),
    }
    active.update(&txn).await?;

    txn.commit().await?;

    if change.changed() {
        info!(
            bazar_id,
            previous = %change.previous,
            current = %change.current,
            reason = outcome.error_reason().unwrap_or_default(),
            "Bazar reachability changed."
        );
    }
    Ok(change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::services::{bazar_service, log_service};
    use crate::test_support::{insert_bazar, setup_db};
    use chrono::Duration;
    use serde_json::json;

    fn unreachable() -> ProbeOutcome {
        ProbeOutcome::Unreachable {
            reason: "HTTP 502".to_string(),
        }
    }

    fn reachable() -> ProbeOutcome {
        ProbeOutcome::Reachable {
            payload: json!({ "name": "Renamed by payload", "city": "Elsewhere" }),
        }
    }

    #[tokio::test]
    async fn going_offline_writes_one_audit_entry() {
        let db = setup_db().await;
        let bazar = insert_bazar(&db, "Chorsu", "10.0.0.1", 8080, Some("Toshkent")).await;
        let now = Utc::now();

        record_status(&db, bazar.id, &reachable(), now).await.unwrap();
        let change = record_status(&db, bazar.id, &unreachable(), now).await.unwrap();
        assert!(change.changed());

        let logs = log_service::get_logs_for_bazar(&db, "10.0.0.1", 8080, 50).await.unwrap();
        let offline: Vec<_> = logs.iter().filter(|l| l.status == "offline").collect();
        assert_eq!(offline.len(), 1);
        assert_eq!(offline[0].previous_status.as_deref(), Some("online"));
        assert_eq!(offline[0].error_message.as_deref(), Some("HTTP 502"));
        assert_eq!(offline[0].action_type, LogActionType::StatusChange);

        let repeated = record_status(&db, bazar.id, &unreachable(), now).await.unwrap();
        assert!(!repeated.changed());
        let logs = log_service::get_logs_for_bazar(&db, "10.0.0.1", 8080, 50).await.unwrap();
        assert_eq!(logs.iter().filter(|l| l.status == "offline").count(), 1);
    }

    #[tokio::test]
    async fn repeated_outcome_is_idempotent_but_refreshes_last_check() {
        let db = setup_db().await;
        let bazar = insert_bazar(&db, "Chorsu", "10.0.0.1", 8080, None).await;
        let first = Utc::now();
        let second = first + Duration::seconds(300);

        record_status(&db, bazar.id, &reachable(), first).await.unwrap();
        record_status(&db, bazar.id, &reachable(), second).await.unwrap();

        let logs = log_service::get_logs(&db, 100, None).await.unwrap();
        assert_eq!(logs.len(), 1);

        let stored = bazar_service::get_bazar_by_id(&db, bazar.id).await.unwrap().unwrap();
        assert_eq!(stored.last_check.timestamp(), second.timestamp());
        assert_eq!(stored.last_online.map(|t| t.timestamp()), Some(second.timestamp()));
        assert_eq!(stored.status, ReachabilityStatus::Online);
    }

    #[tokio::test]
    async fn payload_never_overwrites_name_or_city() {
        let db = setup_db().await;
        let bazar = insert_bazar(&db, "Chorsu", "10.0.0.1", 8080, Some("Toshkent")).await;

        record_status(&db, bazar.id, &reachable(), Utc::now()).await.unwrap();

        let stored = bazar_service::get_bazar_by_id(&db, bazar.id).await.unwrap().unwrap();
        assert_eq!(stored.bazar_name, "Chorsu");
        assert_eq!(stored.city.as_deref(), Some("Toshkent"));
    }

    #[tokio::test]
    async fn unknown_bazar_is_not_found() {
        let db = setup_db().await;
        let result = record_status(&db, 99, &unreachable(), Utc::now()).await;
        assert!(matches!(result, Err(DbErr::RecordNotFound(_))));
    }
}

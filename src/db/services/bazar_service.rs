//! Target registry access: the monitored bazars and their persisted state.
//!
//! Registration, editing and deletion of bazars belong to administrative tooling;
//! this module only reads targets and writes the fields owned by monitoring.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, Unchanged,
};

use crate::db::entities::{bazar_status, prelude::*};
use crate::db::enums::ReachabilityStatus;

pub async fn get_all_bazars<C: ConnectionTrait>(db: &C) -> Result<Vec<bazar_status::Model>, DbErr> {
    BazarStatus::find()
        .order_by_asc(bazar_status::Column::Id)
        .all(db)
        .await
}

pub async fn get_notification_enabled_bazars<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<bazar_status::Model>, DbErr> {
    BazarStatus::find()
        .filter(bazar_status::Column::TelegramNotificationsEnabled.eq(true))
        .order_by_asc(bazar_status::Column::Id)
        .all(db)
        .await
}

pub async fn get_bazar_by_id<C: ConnectionTrait>(
    db: &C,
    bazar_id: i32,
) -> Result<Option<bazar_status::Model>, DbErr> {
    BazarStatus::find_by_id(bazar_id).one(db).await
}

/// Persists the camera-health bookkeeping after an evaluation.
///
/// `last_notification_time` is only written when `Some`; a failed or skipped send keeps
/// the previous timestamp.
pub async fn update_notification_state<C: ConnectionTrait>(
    db: &C,
    bazar_id: i32,
    last_offline_cameras_count: i32,
    last_notification_time: Option<DateTime<Utc>>,
) -> Result<(), DbErr> {
    let mut active = bazar_status::ActiveModel {
        id: Unchanged(bazar_id),
        last_offline_cameras_count: Set(last_offline_cameras_count),
        ..Default::default()
    };
    if let Some(sent_at) = last_notification_time {
        active.last_notification_time = Set(Some(sent_at));
    }
    active.update(db).await?;
    Ok(())
}

/// Toggles notifications for a bazar, optionally changing its reminder interval. The
/// returned flag is true when notifications went from disabled to enabled.
pub async fn set_notifications_enabled<C: ConnectionTrait>(
    db: &C,
    bazar_id: i32,
    enabled: bool,
    check_interval_seconds: Option<i32>,
) -> Result<(bazar_status::Model, bool), DbErr> {
    let bazar = BazarStatus::find_by_id(bazar_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("bazar {bazar_id}")))?;

    let was_enabled = bazar.telegram_notifications_enabled;

    let mut active: bazar_status::ActiveModel = bazar.into();
    active.telegram_notifications_enabled = Set(enabled);
    if let Some(interval) = check_interval_seconds {
        active.notification_check_interval = Set(interval);
    }
    let updated = active.update(db).await?;
    Ok((updated, !was_enabled && enabled))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: u64,
    pub online: u64,
    pub offline: u64,
}

pub async fn get_status_counts<C: ConnectionTrait>(db: &C) -> Result<StatusCounts, DbErr> {
    let total = BazarStatus::find().count(db).await?;
    let online = BazarStatus::find()
        .filter(bazar_status::Column::Status.eq(ReachabilityStatus::Online))
        .count(db)
        .await?;
    let offline = BazarStatus::find()
        .filter(bazar_status::Column::Status.eq(ReachabilityStatus::Offline))
        .count(db)
        .await?;
    Ok(StatusCounts {
        total,
        online,
        offline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_bazar, setup_db};

    #[tokio::test]
    async fn update_notification_state_keeps_timestamp_when_none() {
        let db = setup_db().await;
        let bazar = insert_bazar(&db, "Chorsu", "10.0.0.1", 8080, Some("Toshkent")).await;
        let sent_at = Utc::now();

        update_notification_state(&db, bazar.id, 3, Some(sent_at)).await.unwrap();
        update_notification_state(&db, bazar.id, 5, None).await.unwrap();

        let stored = get_bazar_by_id(&db, bazar.id).await.unwrap().unwrap();
        assert_eq!(stored.last_offline_cameras_count, 5);
        assert_eq!(
            stored.last_notification_time.map(|t| t.timestamp()),
            Some(sent_at.timestamp())
        );
    }

    #[tokio::test]
    async fn notification_enabled_filter_and_counts() {
        let db = setup_db().await;
        let a = insert_bazar(&db, "Chorsu", "10.0.0.1", 8080, None).await;
        insert_bazar(&db, "Oloy", "10.0.0.2", 8080, None).await;

        let (updated, newly_enabled) =
            set_notifications_enabled(&db, a.id, true, Some(600)).await.unwrap();
        assert!(updated.telegram_notifications_enabled);
        assert!(newly_enabled);
        assert_eq!(updated.notification_check_interval, 600);

        let (_, newly_enabled) =
            set_notifications_enabled(&db, a.id, true, Some(900)).await.unwrap();
        assert!(!newly_enabled);

        let enabled = get_notification_enabled_bazars(&db).await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].id, a.id);

        let counts = get_status_counts(&db).await.unwrap();
        assert_eq!(counts.total, 2);
        assert_eq!(counts.offline, 2);
        assert_eq!(counts.online, 0);
    }

    #[tokio::test]
    async fn toggling_unknown_bazar_is_not_found() {
        let db = setup_db().await;
        let result = set_notifications_enabled(&db, 42, true, None).await;
        assert!(matches!(result, Err(DbErr::RecordNotFound(_))));
    }
}

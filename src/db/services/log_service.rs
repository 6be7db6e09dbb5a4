use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::db::entities::{bazar_log, prelude::*};

pub async fn get_logs<C: ConnectionTrait>(
    db: &C,
    limit: u64,
    status_filter: Option<&str>,
) -> Result<Vec<bazar_log::Model>, DbErr> {
    let mut query = BazarLog::find();
    if let Some(status) = status_filter {
        query = query.filter(bazar_log::Column::Status.eq(status));
    }
    query
        .order_by_desc(bazar_log::Column::Timestamp)
        .order_by_desc(bazar_log::Column::Id)
        .limit(limit)
        .all(db)
        .await
}

pub async fn get_logs_for_bazar<C: ConnectionTrait>(
    db: &C,
    ip: &str,
    port: i32,
    limit: u64,
) -> Result<Vec<bazar_log::Model>, DbErr> {
    BazarLog::find()
        .filter(bazar_log::Column::BazarIp.eq(ip))
        .filter(bazar_log::Column::BazarPort.eq(port))
        .order_by_desc(bazar_log::Column::Timestamp)
        .order_by_desc(bazar_log::Column::Id)
        .limit(limit)
        .all(db)
        .await
}

/// Number of distinct endpoints that have ever been logged as offline.
pub async fn count_problem_bazars<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
    BazarLog::find()
        .select_only()
        .column(bazar_log::Column::BazarIp)
        .column(bazar_log::Column::BazarPort)
        .filter(bazar_log::Column::Status.eq("offline"))
        .distinct()
        .count(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::prober::ProbeOutcome;
    use crate::monitoring::status_tracker::record_status;
    use crate::test_support::{insert_bazar, setup_db};
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn up() -> ProbeOutcome {
        ProbeOutcome::Reachable { payload: json!({}) }
    }

    fn down() -> ProbeOutcome {
        ProbeOutcome::Unreachable {
            reason: "Request timed out".to_string(),
        }
    }

    #[tokio::test]
    async fn logs_are_newest_first_and_filterable() {
        let db = setup_db().await;
        let bazar = insert_bazar(&db, "Chorsu", "10.0.0.1", 8080, None).await;
        let start = Utc::now();

        record_status(&db, bazar.id, &up(), start).await.unwrap();
        record_status(&db, bazar.id, &down(), start + Duration::seconds(60)).await.unwrap();
        record_status(&db, bazar.id, &up(), start + Duration::seconds(120)).await.unwrap();

        let all = get_logs(&db, 100, None).await.unwrap();
        let statuses: Vec<&str> = all.iter().map(|l| l.status.as_str()).collect();
        assert_eq!(statuses, ["online", "offline", "online"]);

        let offline = get_logs(&db, 100, Some("offline")).await.unwrap();
        assert_eq!(offline.len(), 1);

        assert_eq!(get_logs(&db, 2, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn per_endpoint_logs_and_problem_count() {
        let db = setup_db().await;
        let first = insert_bazar(&db, "Chorsu", "10.0.0.1", 8080, None).await;
        let second = insert_bazar(&db, "Oloy", "10.0.0.2", 8080, None).await;
        let now = Utc::now();

        for _ in 0..2 {
            record_status(&db, first.id, &up(), now).await.unwrap();
            record_status(&db, first.id, &down(), now).await.unwrap();
        }
        record_status(&db, second.id, &up(), now).await.unwrap();

        let logs = get_logs_for_bazar(&db, "10.0.0.1", 8080, 50).await.unwrap();
        assert_eq!(logs.len(), 4);
        assert!(logs.iter().all(|l| l.bazar_name == "Chorsu"));

        assert_eq!(count_problem_bazars(&db).await.unwrap(), 1);
    }
}

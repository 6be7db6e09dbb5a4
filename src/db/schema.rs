//! Creates missing tables and indexes from the entity definitions.
//!
//! Only `IF NOT EXISTS` statements are issued, so running this against an existing
//! database is a no-op.

use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Schema};
use tracing::debug;

use crate::db::entities::{bazar_log, bazar_status, telegram_chat};

pub async fn ensure_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    create_table(db, &schema, bazar_status::Entity).await?;
    create_table(db, &schema, bazar_log::Entity).await?;
    create_table(db, &schema, telegram_chat::Entity).await?;

    let endpoint_index = Index::create()
        .name("idx_bazar_status_endpoint")
        .table(bazar_status::Entity)
        .col(bazar_status::Column::BazarIp)
        .col(bazar_status::Column::BazarPort)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&endpoint_index)).await?;

    let log_endpoint_index = Index::create()
        .name("idx_bazar_log_endpoint")
        .table(bazar_log::Entity)
        .col(bazar_log::Column::BazarIp)
        .col(bazar_log::Column::BazarPort)
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&log_endpoint_index)).await?;

    Ok(())
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let table = entity.table_name().to_string();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    debug!(table = %table, "Ensured table exists.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::services::bazar_service;
    use crate::test_support::setup_db;
    use sea_orm::Statement;

    #[tokio::test]
    async fn bazars_registered_elsewhere_get_notification_defaults() {
        let db = setup_db().await;
        ensure_schema(&db).await.unwrap();

        // Administrative tooling only fills in the registry columns.
        db.execute(Statement::from_string(
            db.get_database_backend(),
            "INSERT INTO bazar_status \
             (bazar_name, bazar_ip, bazar_port, backend_port, pg_port, status, last_check, \
              uptime_percentage) \
             VALUES ('Chorsu', '10.0.0.1', 8080, 8000, 5432, 'offline', \
              '2024-01-01T00:00:00+00:00', 0.0)",
        ))
        .await
        .unwrap();

        let bazars = bazar_service::get_all_bazars(&db).await.unwrap();
        assert_eq!(bazars.len(), 1);
        assert!(!bazars[0].telegram_notifications_enabled);
        assert_eq!(bazars[0].notification_check_interval, 3600);
        assert_eq!(bazars[0].last_offline_cameras_count, 0);
        assert_eq!(bazars[0].last_notification_time, None);
    }
}

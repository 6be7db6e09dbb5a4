use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::enums::LogActionType;

/// Append-only audit record. `status` holds the new reachability for status changes
/// and the action name (`added`/`updated`/`deleted`) for administrative entries.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bazar_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub bazar_name: String,
    pub bazar_ip: String,
    pub bazar_port: i32,
    pub city: Option<String>,
    pub status: String,
    pub previous_status: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
    pub action_type: LogActionType,
    #[sea_orm(column_type = "Json", nullable)]
    pub action_details: Option<Json>,
    pub timestamp: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

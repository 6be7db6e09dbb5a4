use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::enums::ReachabilityStatus;

/// A monitored bazar installation. Identity is the `(bazar_ip, bazar_port)` pair.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bazar_status")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub bazar_name: String,
    pub bazar_ip: String,
    pub bazar_port: i32,
    pub backend_port: i32,
    pub pg_port: i32,
    pub city: Option<String>,
    pub status: ReachabilityStatus,
    pub last_online: Option<ChronoDateTimeUtc>,
    pub last_offline: Option<ChronoDateTimeUtc>,
    pub last_check: ChronoDateTimeUtc,
    pub uptime_percentage: f64,
    pub contact_click: Option<String>,
    pub contact_click_name: Option<String>,
    pub contact_scc: Option<String>,
    pub contact_scc_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[sea_orm(default_value = false)]
    pub telegram_notifications_enabled: bool,
    /// Minimum seconds between reminder notifications while cameras stay offline.
    #[sea_orm(default_value = 3600)]
    pub notification_check_interval: i32,
    #[sea_orm(default_value = 0)]
    pub last_offline_cameras_count: i32,
    pub last_notification_time: Option<ChronoDateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// `ip:port` label used when a bazar has no usable display name.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.bazar_ip, self.bazar_port)
    }

    /// The city, unless it is missing, blank or the `Unknown` placeholder.
    pub fn region(&self) -> Option<&str> {
        self.city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("unknown"))
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::entities::{bazar_log, bazar_status};
use crate::db::enums::{LogActionType, ReachabilityStatus};

/// Persisted bazar state as exposed by the API.
#[derive(Serialize, Debug, Clone)]
pub struct BazarView {
    pub id: i32,
    pub name: String,
    pub ip: String,
    pub port: i32,
    pub backend_port: i32,
    pub pg_port: i32,
    pub city: Option<String>,
    pub status: ReachabilityStatus,
    pub last_online: Option<DateTime<Utc>>,
    pub last_offline: Option<DateTime<Utc>>,
    pub last_check: DateTime<Utc>,
    pub uptime_percentage: f64,
    pub contact_click: Option<String>,
    pub contact_click_name: Option<String>,
    pub contact_scc: Option<String>,
    pub contact_scc_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub telegram_notifications_enabled: bool,
    pub notification_check_interval: i32,
    pub last_offline_cameras_count: i32,
    pub last_notification_time: Option<DateTime<Utc>>,
}

impl From<bazar_status::Model> for BazarView {
    fn from(b: bazar_status::Model) -> Self {
        Self {
            id: b.id,
            name: b.bazar_name,
            ip: b.bazar_ip,
            port: b.bazar_port,
            backend_port: b.backend_port,
            pg_port: b.pg_port,
            city: b.city,
            status: b.status,
            last_online: b.last_online,
            last_offline: b.last_offline,
            last_check: b.last_check,
            uptime_percentage: b.uptime_percentage,
            contact_click: b.contact_click,
            contact_click_name: b.contact_click_name,
            contact_scc: b.contact_scc,
            contact_scc_name: b.contact_scc_name,
            latitude: b.latitude,
            longitude: b.longitude,
            telegram_notifications_enabled: b.telegram_notifications_enabled,
            notification_check_interval: b.notification_check_interval,
            last_offline_cameras_count: b.last_offline_cameras_count,
            last_notification_time: b.last_notification_time,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct LogView {
    pub id: i32,
    pub bazar_name: String,
    pub bazar_ip: String,
    pub bazar_port: i32,
    pub city: Option<String>,
    pub status: String,
    pub previous_status: Option<String>,
    pub error_message: Option<String>,
    pub action_type: LogActionType,
    pub action_details: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl From<bazar_log::Model> for LogView {
    fn from(l: bazar_log::Model) -> Self {
        Self {
            id: l.id,
            bazar_name: l.bazar_name,
            bazar_ip: l.bazar_ip,
            bazar_port: l.bazar_port,
            city: l.city,
            status: l.status,
            previous_status: l.previous_status,
            error_message: l.error_message,
            action_type: l.action_type,
            action_details: l.action_details,
            timestamp: l.timestamp,
        }
    }
}

/// `{ "success": true, "data": [...], "total": n }`
#[derive(Serialize, Debug, Clone)]
pub struct ListResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub total: usize,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            total: data.len(),
            data,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct StatisticsView {
    pub total: u64,
    pub online: u64,
    pub offline: u64,
    pub uptime_percentage: f64,
    pub recent_changes: Vec<LogView>,
    pub problem_count: u64,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct LogsQuery {
    pub limit: Option<u64>,
    pub status: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ToggleNotificationsRequest {
    pub enabled: bool,
    pub check_interval: Option<i32>,
}

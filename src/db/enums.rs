use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reachability of a bazar as last observed by a probe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text", enum_name = "reachability_status_enum")]
#[serde(rename_all = "lowercase")]
pub enum ReachabilityStatus {
    #[sea_orm(string_value = "online")]
    Online,
    #[sea_orm(string_value = "offline")]
    Offline,
}

impl ReachabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReachabilityStatus::Online => "online",
            ReachabilityStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for ReachabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text", enum_name = "chat_type_enum")]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    #[sea_orm(string_value = "channel")]
    Channel,
    #[sea_orm(string_value = "group")]
    Group,
    #[sea_orm(string_value = "user")]
    User,
}

impl fmt::Display for ChatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChatType::Channel => "channel",
            ChatType::Group => "group",
            ChatType::User => "user",
        };
        f.write_str(s)
    }
}

/// Kind of an audit log entry. Only `StatusChange` entries are written by polling;
/// the service_* kinds come from administrative tooling sharing the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text", enum_name = "log_action_type_enum")]
#[serde(rename_all = "snake_case")]
pub enum LogActionType {
    #[sea_orm(string_value = "status_change")]
    StatusChange,
    #[sea_orm(string_value = "service_added")]
    ServiceAdded,
    #[sea_orm(string_value = "service_updated")]
    ServiceUpdated,
    #[sea_orm(string_value = "service_deleted")]
    ServiceDeleted,
}

//! SeaORM entities for the monitoring database.

pub mod bazar_log;
pub mod bazar_status;
pub mod telegram_chat;

pub mod prelude {
    pub use super::bazar_status::Entity as BazarStatus;
    pub use super::bazar_status::Model as BazarStatusModel;
    pub use super::bazar_status::ActiveModel as BazarStatusActiveModel;
    pub use super::bazar_status::Column as BazarStatusColumn;

    pub use super::bazar_log::Entity as BazarLog;
    pub use super::bazar_log::Model as BazarLogModel;
    pub use super::bazar_log::ActiveModel as BazarLogActiveModel;
    pub use super::bazar_log::Column as BazarLogColumn;

    pub use super::telegram_chat::Entity as TelegramChat;
    pub use super::telegram_chat::Model as TelegramChatModel;
    pub use super::telegram_chat::ActiveModel as TelegramChatActiveModel;
    pub use super::telegram_chat::Column as TelegramChatColumn;
}

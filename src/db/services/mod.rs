pub mod bazar_service;
pub mod log_service;
pub mod telegram_chat_service;

pub mod bazar_routes;
pub mod log_routes;
pub mod service_routes;
pub mod telegram_routes;

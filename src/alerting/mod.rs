pub mod camera_health;
pub mod evaluation_service;

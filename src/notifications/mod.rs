pub mod bot;
pub mod message;
pub mod models;
pub mod region;
pub mod senders;
pub mod service;

pub mod alerting;
pub mod db;
pub mod monitoring;
pub mod notifications;
pub mod server;
pub mod web;

#[cfg(test)]
mod test_support;

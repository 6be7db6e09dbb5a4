pub mod pipeline;
pub mod prober;
pub mod status_tracker;

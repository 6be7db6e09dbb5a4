use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::monitoring::pipeline::MonitoringPipeline;

/// Background worker running the monitoring sweep on a fixed period.
///
/// Started once by the binary's startup sequence; the returned handle owns the task.
pub struct MonitoringScheduler {
    pipeline: Arc<MonitoringPipeline>,
    period: Duration,
}

impl MonitoringScheduler {
    pub fn new(pipeline: Arc<MonitoringPipeline>, period: Duration) -> Self {
        Self { pipeline, period }
    }

    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(period_seconds = self.period.as_secs(), "Monitoring scheduler started.");
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.pipeline.run_sweep().await {
                    error!(error = %e, "Monitoring sweep failed.");
                }
            }
        })
    }
}

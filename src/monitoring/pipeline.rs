use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use super::prober::{CameraStatistics, ProbeKind, ProbeOutcome, Prober};
use super::status_tracker::{self, StatusChange};
use crate::alerting::camera_health::CameraHealthSnapshot;
use crate::alerting::evaluation_service::{EvaluationError, EvaluationOutcome, EvaluationService};
use crate::db::entities::bazar_status;
use crate::db::enums::ReachabilityStatus;
use crate::db::services::bazar_service;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub ip: String,
    pub port: i32,
    pub backend_port: i32,
    pub pg_port: i32,
}

/// Result of one interactive liveness poll, as returned by `GET /api/bazars`.
#[derive(Debug, Clone, Serialize)]
pub struct PollResult {
    pub id: i32,
    pub name: String,
    pub city: Option<String>,
    pub status: ReachabilityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub endpoint: Endpoint,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetCheck {
    pub bazar_id: i32,
    pub status: StatusChange,
    /// `None` when the camera statistics could not be obtained.
    pub camera: Option<EvaluationOutcome>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub checked: usize,
    pub failed: usize,
}

/// Prober → status tracker → camera-health evaluation, for interactive polls and for the
/// background sweep.
pub struct MonitoringPipeline {
    db: DatabaseConnection,
    prober: Arc<dyn Prober>,
    evaluation: Arc<EvaluationService>,
    sweep_concurrency: usize,
}

impl MonitoringPipeline {
    pub fn new(
        db: DatabaseConnection,
        prober: Arc<dyn Prober>,
        evaluation: Arc<EvaluationService>,
        sweep_concurrency: usize,
    ) -> Self {
        Self {
            db,
            prober,
            evaluation,
            sweep_concurrency: sweep_concurrency.max(1),
        }
    }

    /// Liveness-probes every registered bazar and records the outcomes. A bazar whose
    /// status cannot be stored is still reported, and the failure is logged.
    pub async fn poll_all(&self) -> Result<Vec<PollResult>, PipelineError> {
        let bazars = bazar_service::get_all_bazars(&self.db).await?;

        let results = stream::iter(bazars)
            .map(|bazar| async move {
                let outcome = self.prober.probe(&bazar, ProbeKind::Liveness).await;
                let now = Utc::now();
                let recorded =
                    status_tracker::record_status(&self.db, bazar.id, &outcome, now).await;
                if let Err(e) = recorded {
                    error!(bazar_id = bazar.id, error = %e, "Failed to record bazar status.");
                }
                poll_result(bazar, &outcome, now)
            })
            .buffered(self.sweep_concurrency)
            .collect::<Vec<_>>()
            .await;

        Ok(results)
    }

    /// Runs the full pipeline for one bazar. Camera statistics are only fetched when the
    /// bazar answered the liveness probe.
    pub async fn check_target(
        &self,
        bazar: &bazar_status::Model,
    ) -> Result<TargetCheck, PipelineError> {
        let liveness = self.prober.probe(bazar, ProbeKind::Liveness).await;
        let status =
            status_tracker::record_status(&self.db, bazar.id, &liveness, Utc::now()).await?;

        let camera = if liveness.is_reachable() {
            match self.fetch_snapshot(bazar).await {
                Some(snapshot) => {
                    // Reload so the evaluation sees the latest notification bookkeeping.
                    let current = bazar_service::get_bazar_by_id(&self.db, bazar.id)
                        .await?
                        .ok_or_else(|| DbErr::RecordNotFound(format!("bazar {}", bazar.id)))?;
                    Some(self.evaluation.evaluate(&current, &snapshot, Utc::now()).await?)
                }
                None => None,
            }
        } else {
            None
        };

        Ok(TargetCheck {
            bazar_id: bazar.id,
            status,
            camera,
        })
    }

    /// Checks every notification-enabled bazar. Failures are logged per bazar and never
    /// stop the rest of the sweep.
    pub async fn run_sweep(&self) -> Result<SweepSummary, PipelineError> {
        let bazars = bazar_service::get_notification_enabled_bazars(&self.db).await?;
        debug!(count = bazars.len(), "Starting monitoring sweep.");

        let results: Vec<(i32, Result<TargetCheck, PipelineError>)> = stream::iter(bazars)
            .map(|bazar| async move { (bazar.id, self.check_target(&bazar).await) })
            .buffer_unordered(self.sweep_concurrency)
            .collect()
            .await;

        let mut summary = SweepSummary::default();
        for (bazar_id, result) in results {
            summary.checked += 1;
            if let Err(e) = result {
                summary.failed += 1;
                error!(bazar_id, error = %e, "Monitoring check failed.");
            }
        }
        info!(checked = summary.checked, failed = summary.failed, "Monitoring sweep finished.");
        Ok(summary)
    }

    /// Probes camera statistics and pushes the current status to eligible recipients.
    /// Returns the number of recipients reached, or `None` when no statistics were
    /// available.
    pub async fn push_current_status(
        &self,
        bazar: &bazar_status::Model,
    ) -> Result<Option<usize>, PipelineError> {
        let Some(snapshot) = self.fetch_snapshot(bazar).await else {
            return Ok(None);
        };
        let sent = self.evaluation.push_status(bazar, &snapshot, Utc::now()).await?;
        Ok(Some(sent))
    }

    async fn fetch_snapshot(&self, bazar: &bazar_status::Model) -> Option<CameraHealthSnapshot> {
        match self.prober.probe(bazar, ProbeKind::Statistics).await {
            ProbeOutcome::Reachable { payload } => match CameraStatistics::from_payload(&payload) {
                Some(stats) => Some(stats.into()),
                None => {
                    debug!(bazar_id = bazar.id, "Statistics payload has no camera counts.");
                    None
                }
            },
            ProbeOutcome::Unreachable { reason } => {
                debug!(bazar_id = bazar.id, reason = %reason, "Camera statistics unavailable.");
                None
            }
        }
    }
}

fn poll_result(
    bazar: bazar_status::Model,
    outcome: &ProbeOutcome,
    now: DateTime<Utc>,
) -> PollResult {
    let status = if outcome.is_reachable() {
        ReachabilityStatus::Online
    } else {
        ReachabilityStatus::Offline
    };
    PollResult {
        id: bazar.id,
        name: bazar.bazar_name,
        city: bazar.city,
        status,
        error: outcome.error_reason().map(str::to_string),
        endpoint: Endpoint {
            ip: bazar.bazar_ip,
            port: bazar.bazar_port,
            backend_port: bazar.backend_port,
            pg_port: bazar.pg_port,
        },
        timestamp: now,
    }
}

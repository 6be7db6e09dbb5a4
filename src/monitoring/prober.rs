use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::db::entities::bazar_status;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    /// `GET /api/application/bazar-info`: is the bazar backend answering at all.
    Liveness,
    /// `GET /api/cameras/statistics`: aggregate camera counts.
    Statistics,
}

impl ProbeKind {
    pub fn path(&self) -> &'static str {
        match self {
            ProbeKind::Liveness => "/api/application/bazar-info",
            ProbeKind::Statistics => "/api/cameras/statistics",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Reachable { payload: Value },
    Unreachable { reason: String },
}

impl ProbeOutcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeOutcome::Reachable { .. })
    }

    pub fn error_reason(&self) -> Option<&str> {
        match self {
            ProbeOutcome::Reachable { .. } => None,
            ProbeOutcome::Unreachable { reason } => Some(reason),
        }
    }
}

/// Aggregate counts reported by a bazar's statistics endpoint. Category breakdowns in the
/// same payload are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraStatistics {
    #[serde(default)]
    pub total_cameras: i32,
    #[serde(default)]
    pub online_cameras: i32,
    #[serde(default)]
    pub offline_cameras: i32,
}

impl CameraStatistics {
    /// Reads the counts from a statistics payload, accepting them either at the top level
    /// or wrapped in a `data` object. Returns `None` when neither shape holds a count.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let object = match payload.get("data") {
            Some(inner) if inner.get("totalCameras").is_some() => inner,
            _ => payload,
        };
        if object.get("totalCameras").is_none() {
            return None;
        }
        serde_json::from_value(object.clone()).ok()
    }
}

/// One bounded-timeout health check against a bazar. Never retries; never mutates state.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, bazar: &bazar_status::Model, kind: ProbeKind) -> ProbeOutcome;
}

pub struct HttpProber {
    client: Client,
    liveness_timeout: Duration,
    statistics_timeout: Duration,
}

impl HttpProber {
    pub fn new(
        liveness_timeout: Duration,
        statistics_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            liveness_timeout,
            statistics_timeout,
        })
    }

    fn timeout_for(&self, kind: ProbeKind) -> Duration {
        match kind {
            ProbeKind::Liveness => self.liveness_timeout,
            ProbeKind::Statistics => self.statistics_timeout,
        }
    }
}

pub fn probe_url(bazar: &bazar_status::Model, kind: ProbeKind) -> String {
    format!(
        "http://{}:{}{}",
        bazar.bazar_ip,
        bazar.backend_port,
        kind.path()
    )
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, bazar: &bazar_status::Model, kind: ProbeKind) -> ProbeOutcome {
        let url = probe_url(bazar, kind);
        let result = self
            .client
            .get(&url)
            .timeout(self.timeout_for(kind))
            .send()
            .await;

        let outcome = match result {
            Ok(response) if response.status().is_success() => match response.json::<Value>().await {
                Ok(payload) => ProbeOutcome::Reachable { payload },
                Err(e) => ProbeOutcome::Unreachable {
                    reason: format!("Invalid JSON response: {e}"),
                },
            },
            Ok(response) => ProbeOutcome::Unreachable {
                reason: format!("HTTP {}", response.status().as_u16()),
            },
            Err(e) if e.is_timeout() => ProbeOutcome::Unreachable {
                reason: "Request timed out".to_string(),
            },
            Err(e) => ProbeOutcome::Unreachable {
                reason: e.to_string(),
            },
        };

        debug!(
            bazar_id = bazar.id,
            url = %url,
            reachable = outcome.is_reachable(),
            "Probe finished."
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bazar_model;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn target_for(server: &MockServer) -> bazar_status::Model {
        let mut bazar = bazar_model(1, "Chorsu", None);
        bazar.bazar_ip = server.address().ip().to_string();
        bazar.backend_port = i32::from(server.address().port());
        bazar
    }

    fn prober() -> HttpProber {
        HttpProber::new(Duration::from_millis(300), Duration::from_millis(300)).unwrap()
    }

    #[tokio::test]
    async fn success_returns_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cameras/statistics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalCameras": 12, "onlineCameras": 9, "offlineCameras": 3
            })))
            .mount(&server)
            .await;

        let outcome = prober().probe(&target_for(&server), ProbeKind::Statistics).await;
        let ProbeOutcome::Reachable { payload } = outcome else {
            panic!("expected a reachable outcome");
        };
        let stats = CameraStatistics::from_payload(&payload).unwrap();
        assert_eq!(stats.total_cameras, 12);
        assert_eq!(stats.offline_cameras, 3);
    }

    #[tokio::test]
    async fn error_status_is_unreachable_with_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/application/bazar-info"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let outcome = prober().probe(&target_for(&server), ProbeKind::Liveness).await;
        assert_eq!(outcome.error_reason(), Some("HTTP 503"));
    }

    #[tokio::test]
    async fn slow_target_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "name": "Chorsu" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let outcome = prober().probe(&target_for(&server), ProbeKind::Liveness).await;
        assert!(!outcome.is_reachable());
    }

    #[test]
    fn statistics_payload_shapes() {
        let wrapped = json!({
            "success": true,
            "data": { "totalCameras": 4, "offlineCameras": 1 }
        });
        assert_eq!(
            CameraStatistics::from_payload(&wrapped),
            Some(CameraStatistics {
                total_cameras: 4,
                online_cameras: 0,
                offline_cameras: 1
            })
        );
        assert_eq!(CameraStatistics::from_payload(&json!({ "cameras": [] })), None);
        assert_eq!(CameraStatistics::from_payload(&json!({ "totalCameras": "many" })), None);
    }
}

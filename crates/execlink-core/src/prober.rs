// ── Endpoint prober ──
//
// One `GET /port-status` against one candidate. Every failure mode collapses
// into `CoreError::Unreachable`: discovery only cares whether a backend
// answered, not why it didn't.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use execlink_api::{BackendClient, TransportConfig};

use crate::config::Candidate;
use crate::convert::snapshot_from_status;
use crate::error::CoreError;
use crate::model::{Endpoint, StatusSnapshot};

/// A confirmed endpoint plus the state it reported while being probed.
#[derive(Debug, Clone)]
pub struct Probed {
    pub endpoint: Endpoint,
    pub snapshot: StatusSnapshot,
}

/// Tests a single candidate address for a live backend.
pub trait Prober: Send + Sync + 'static {
    fn probe(&self, candidate: &Candidate) -> impl Future<Output = Result<Probed, CoreError>> + Send;
}

impl<P: Prober> Prober for Arc<P> {
    fn probe(&self, candidate: &Candidate) -> impl Future<Output = Result<Probed, CoreError>> + Send {
        (**self).probe(candidate)
    }
}

/// HTTP prober with a hard per-probe timeout.
#[derive(Debug, Clone)]
pub struct HttpProber {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Result<Self, CoreError> {
        let http = TransportConfig::default()
            .with_timeout(timeout)
            .build_client()?;
        Ok(Self { http, timeout })
    }
}

impl Prober for HttpProber {
    async fn probe(&self, candidate: &Candidate) -> Result<Probed, CoreError> {
        let client = BackendClient::with_client(self.http.clone(), candidate.base_url()?);

        // The client timeout covers the request; this one also bounds
        // anything the client doesn't (e.g. a stalled body read).
        let status = match tokio::time::timeout(self.timeout, client.port_status()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                debug!(port = candidate.port, error = %e, "probe failed");
                return Err(CoreError::Unreachable {
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                debug!(port = candidate.port, "probe timed out");
                return Err(CoreError::Unreachable {
                    reason: format!("timed out after {}ms", self.timeout.as_millis()),
                });
            }
        };

        let snapshot = snapshot_from_status(status, candidate.port);
        let endpoint = Endpoint::new(candidate.host.clone(), snapshot.port, snapshot.tcp_port)?;
        Ok(Probed { endpoint, snapshot })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn candidate_for(server: &MockServer) -> Candidate {
        let addr = server.address();
        Candidate::new(addr.ip().to_string(), addr.port())
    }

    #[tokio::test]
    async fn probe_confirms_endpoint_from_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/port-status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "port": "",
                "status": "connected",
                "tcpPort": 9100
            })))
            .expect(1)
            .mount(&server)
            .await;

        let candidate = candidate_for(&server);
        let prober = HttpProber::new(Duration::from_secs(2)).unwrap();
        let probed = prober.probe(&candidate).await.unwrap();

        assert_eq!(probed.endpoint.port(), candidate.port);
        assert_eq!(probed.endpoint.tcp_port(), 9100);
        assert_eq!(probed.snapshot.status, "connected");
    }

    #[tokio::test]
    async fn non_success_status_is_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/port-status"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let prober = HttpProber::new(Duration::from_secs(2)).unwrap();
        let result = prober.probe(&candidate_for(&server)).await;
        assert!(matches!(result, Err(CoreError::Unreachable { .. })));
    }

    #[tokio::test]
    async fn slow_backend_hits_probe_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/port-status"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "port": "8080", "status": "connected" }))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let prober = HttpProber::new(Duration::from_millis(200)).unwrap();
        let result = prober.probe(&candidate_for(&server)).await;
        assert!(matches!(result, Err(CoreError::Unreachable { .. })));
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let prober = HttpProber::new(Duration::from_secs(2)).unwrap();
        let result = prober.probe(&Candidate::new("127.0.0.1", 9)).await;
        assert!(matches!(result, Err(CoreError::Unreachable { .. })));
    }
}

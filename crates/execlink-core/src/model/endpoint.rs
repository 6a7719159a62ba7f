// ── Endpoint domain type ──

use std::fmt;

use serde::Serialize;
use url::Url;

use crate::config::Candidate;
use crate::error::CoreError;

/// A discovered backend: HTTP port plus the auxiliary raw-socket port it
/// advertises. Immutable once built; rediscovery replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    tcp_port: u16,
    base_url: Url,
    stream_url: Url,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16, tcp_port: u16) -> Result<Self, CoreError> {
        let host = host.into();
        let candidate = Candidate::new(host.clone(), port);
        let base_url = candidate.base_url()?;
        let stream_url =
            execlink_api::websocket::stream_url(&base_url).map_err(|e| CoreError::Config {
                message: format!("invalid stream URL for {candidate}: {e}"),
            })?;

        Ok(Self {
            host,
            port,
            tcp_port,
            base_url,
            stream_url,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn tcp_port(&self) -> u16 {
        self.tcp_port
    }

    /// `http://<host>:<port>/`
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `ws://<host>:<port>/ws`
    pub fn stream_url(&self) -> &Url {
        &self.stream_url
    }

    /// The candidate that re-probes this endpoint.
    pub fn candidate(&self) -> Candidate {
        Candidate::new(self.host.clone(), self.port)
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            http_url: self.base_url.to_string(),
            stream_url: self.stream_url.to_string(),
            tcp_address: format!("{}:{}", self.host, self.tcp_port),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Addresses a user needs to reach the backend by other means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub http_url: String,
    pub stream_url: String,
    pub tcp_address: String,
}

// ── Runtime orchestrator configuration ──
//
// These types describe *where* to look for a backend and how patiently.
// They never touch disk: the CLI (via `execlink-config`) constructs an
// `OrchestratorConfig` and hands it in.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::CoreError;

/// One address the discovery engine may probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub host: String,
    pub port: u16,
}

impl Candidate {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `http://<host>:<port>/`
    pub fn base_url(&self) -> Result<Url, CoreError> {
        Url::parse(&format!("http://{}:{}", self.host, self.port)).map_err(|e| CoreError::Config {
            message: format!("invalid candidate address {self}: {e}"),
        })
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Configuration for one orchestrator instance.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Host the backend listens on.
    pub host: String,
    /// First candidate port.
    pub base_port: u16,
    /// Number of consecutive candidate ports starting at `base_port`.
    pub candidate_count: u16,
    /// Retries after the first failed probe before discovery gives up.
    pub max_retries: u32,
    /// Fixed delay between discovery attempts.
    pub retry_delay: Duration,
    /// Hard timeout on every status probe.
    pub probe_timeout: Duration,
    /// Timeout for authenticated commands.
    pub request_timeout: Duration,
    /// Console lines kept in memory for late subscribers.
    pub log_history: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            base_port: 8080,
            candidate_count: 5,
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
            probe_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
            log_history: 1000,
        }
    }
}

impl OrchestratorConfig {
    /// The ordered candidate list: `base_port..base_port + candidate_count`.
    ///
    /// Ports that would overflow `u16` are dropped.
    pub fn candidates(&self) -> Vec<Candidate> {
        (0..self.candidate_count)
            .filter_map(|offset| self.base_port.checked_add(offset))
            .map(|port| Candidate::new(self.host.clone(), port))
            .collect()
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.host.trim().is_empty() {
            return Err(CoreError::Config {
                message: "host must not be empty".into(),
            });
        }
        if self.candidates().is_empty() {
            return Err(CoreError::Config {
                message: "at least one candidate port is required".into(),
            });
        }
        if self.probe_timeout.is_zero() {
            return Err(CoreError::Config {
                message: "probe timeout must be non-zero".into(),
            });
        }
        Ok(())
    }
}

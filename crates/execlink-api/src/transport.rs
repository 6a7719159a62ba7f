// Shared transport configuration for building reqwest::Client instances.
//
// The prober and the command client share the user agent and timeout
// settings through this module. Probes use a much shorter timeout than
// commands, so each caller builds its own client from a tuned copy.

use std::time::Duration;

use crate::error::Error;

const USER_AGENT: &str = concat!("execlink/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Whole-request timeout, enforced by the client itself rather than
    /// left to the network stack.
    pub timeout: Duration,
    /// Connect-phase timeout. Loopback candidates either accept instantly
    /// or not at all.
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(2),
        }
    }
}

impl TransportConfig {
    /// Copy of this config with a different whole-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        if self.connect_timeout > timeout {
            self.connect_timeout = timeout;
        }
        self
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(Error::Transport)
    }
}

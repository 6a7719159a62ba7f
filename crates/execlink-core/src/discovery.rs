// ── Discovery engine ──
//
// Walks the candidate list with linear retry. Attempt `i` probes
// `candidates[i % len]`; after a failure, attempt `i + 1` runs once the
// fixed delay elapses, until `max_retries` retries have been spent.
//
// Only one cycle runs at a time. Each `discover()` swaps in a fresh
// `RetryTimer` token and cancels the previous one, so a superseded cycle
// stops at its next await point (mid-probe or mid-delay) with
// `CoreError::Cancelled` and never issues another probe.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{Candidate, OrchestratorConfig};
use crate::error::CoreError;
use crate::log::LogSink;
use crate::prober::{Probed, Prober};

// ── RetryTimer ───────────────────────────────────────────────────────

/// Cancellation handle for the in-flight discovery cycle.
#[derive(Debug, Default)]
struct RetryTimer {
    current: Mutex<CancellationToken>,
}

impl RetryTimer {
    /// Cancel the previous cycle and hand out a token for a new one.
    fn replace(&self) -> CancellationToken {
        let fresh = CancellationToken::new();
        let previous = std::mem::replace(
            &mut *self.current.lock().unwrap_or_else(PoisonError::into_inner),
            fresh.clone(),
        );
        previous.cancel();
        fresh
    }

    fn cancel(&self) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }
}

// ── DiscoveryEngine ──────────────────────────────────────────────────

pub struct DiscoveryEngine<P: Prober> {
    prober: P,
    candidates: Vec<Candidate>,
    max_retries: u32,
    retry_delay: Duration,
    timer: RetryTimer,
    log: LogSink,
}

impl<P: Prober> DiscoveryEngine<P> {
    pub fn new(prober: P, config: &OrchestratorConfig, log: LogSink) -> Self {
        Self {
            prober,
            candidates: config.candidates(),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
            timer: RetryTimer::default(),
            log,
        }
    }

    pub fn prober(&self) -> &P {
        &self.prober
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Run one discovery cycle from attempt zero.
    ///
    /// Cancels any cycle already in flight. Returns the first candidate
    /// that answers, `DiscoveryFailed` once the retry budget is spent, or
    /// `Cancelled` if a newer cycle (or [`cancel`](Self::cancel)) took over.
    pub async fn discover(&self) -> Result<Probed, CoreError> {
        let token = self.timer.replace();

        if self.candidates.is_empty() {
            return Err(CoreError::Config {
                message: "no candidate ports configured".into(),
            });
        }

        let mut attempt: u32 = 0;
        loop {
            let index = usize::try_from(attempt).unwrap_or(usize::MAX) % self.candidates.len();
            let Some(candidate) = self.candidates.get(index) else {
                return Err(CoreError::Internal(format!("candidate index {index} out of range")));
            };

            if attempt > 0 {
                self.log.system(format!(
                    "Retry attempt {attempt}/{} to connect to server...",
                    self.max_retries
                ));
            }
            self.log
                .system(format!("Trying to connect to port {}...", candidate.port));
            debug!(attempt, port = candidate.port, "probing candidate");

            let outcome = tokio::select! {
                biased;
                () = token.cancelled() => return Err(CoreError::Cancelled),
                outcome = self.prober.probe(candidate) => outcome,
            };

            match outcome {
                Ok(probed) => {
                    info!(attempt, port = probed.endpoint.port(), "backend discovered");
                    self.log
                        .system(format!("Found server on port {}", probed.endpoint.port()));
                    self.log.system(format!(
                        "TCP server available on port {}",
                        probed.endpoint.tcp_port()
                    ));
                    return Ok(probed);
                }
                Err(e) => {
                    debug!(attempt, port = candidate.port, error = %e, "candidate unreachable");
                }
            }

            if attempt >= self.max_retries {
                let err = CoreError::DiscoveryFailed {
                    attempts: self.max_retries,
                };
                self.log.error(err.to_string());
                return Err(err);
            }

            self.log.error(format!(
                "Connection failed. Retrying in {} seconds...",
                self.retry_delay.as_secs()
            ));

            tokio::select! {
                biased;
                () = token.cancelled() => return Err(CoreError::Cancelled),
                () = tokio::time::sleep(self.retry_delay) => {}
            }

            attempt += 1;
        }
    }

    /// Cancel the in-flight cycle, if any. Safe from any state.
    pub fn cancel(&self) {
        self.timer.cancel();
    }
}

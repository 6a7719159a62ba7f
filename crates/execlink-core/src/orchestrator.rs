// ── Orchestrator ──
//
// Owns the endpoint, credential, status snapshot and stream session, and
// wires the discovery engine, stream supervisor, session store, status
// mirror and command dispatcher together. Constructed once per process;
// `shutdown()` closes the stream and cancels every timer it started.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use arc_swap::ArcSwapOption;
use secrecy::SecretString;
use serde::Serialize;
use strum::Display;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use execlink_api::{Registration, StreamTransport, TransportConfig, WsTransport};

use crate::command::{CommandDispatcher, CommandResult, Operation};
use crate::config::OrchestratorConfig;
use crate::discovery::DiscoveryEngine;
use crate::error::CoreError;
use crate::log::{LogLine, LogSink};
use crate::mirror::StatusMirror;
use crate::model::{ConnectionInfo, Endpoint, Feature, Identity, StatusSnapshot};
use crate::prober::{HttpProber, Prober};
use crate::session::{SessionPersistence, SessionStore};
use crate::stream::{StreamState, StreamSupervisor};

// ── ConnectionState ──────────────────────────────────────────────────

/// Overall connectivity, derived from discovery and stream state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum ConnectionState {
    /// No endpoint known and no discovery running.
    Disconnected,
    /// A discovery cycle is in flight.
    Discovering,
    /// An endpoint is known but the event stream is not open.
    Reachable,
    /// Endpoint known and event stream open.
    Connected,
}

// ── Orchestrator ─────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<Inner>`.
pub struct Orchestrator<P: Prober = HttpProber, T: StreamTransport = WsTransport> {
    inner: Arc<Inner<P, T>>,
}

impl<P: Prober, T: StreamTransport> Clone for Orchestrator<P, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<P: Prober, T: StreamTransport> {
    config: OrchestratorConfig,
    log: LogSink,
    discovery: DiscoveryEngine<Arc<P>>,
    discovering: AtomicUsize,
    supervisor: StreamSupervisor<T>,
    endpoint: Arc<ArcSwapOption<Endpoint>>,
    session: Arc<SessionStore>,
    mirror: Arc<StatusMirror>,
    dispatcher: CommandDispatcher<P>,
}

impl Orchestrator {
    /// Build an orchestrator with the HTTP prober and WebSocket transport.
    pub fn new(
        config: OrchestratorConfig,
        persistence: Box<dyn SessionPersistence>,
    ) -> Result<Self, CoreError> {
        let prober = HttpProber::new(config.probe_timeout)?;
        Self::with_parts(config, prober, WsTransport, persistence)
    }
}

impl<P: Prober, T: StreamTransport> Orchestrator<P, T> {
    /// Build an orchestrator around custom probe and stream transports.
    pub fn with_parts(
        config: OrchestratorConfig,
        prober: P,
        transport: T,
        persistence: Box<dyn SessionPersistence>,
    ) -> Result<Self, CoreError> {
        config.validate()?;

        let log = LogSink::new(config.log_history);
        let prober = Arc::new(prober);
        let http = TransportConfig::default()
            .with_timeout(config.request_timeout)
            .build_client()?;

        let endpoint = Arc::new(ArcSwapOption::empty());
        let session = Arc::new(SessionStore::new(persistence));
        let mirror = Arc::new(StatusMirror::default());

        let dispatcher = CommandDispatcher::new(
            http,
            Arc::clone(&prober),
            Arc::clone(&endpoint),
            Arc::clone(&session),
            Arc::clone(&mirror),
            log.clone(),
        );

        Ok(Self {
            inner: Arc::new(Inner {
                discovery: DiscoveryEngine::new(prober, &config, log.clone()),
                discovering: AtomicUsize::new(0),
                supervisor: StreamSupervisor::new(transport, log.clone(), config.probe_timeout),
                config,
                log,
                endpoint,
                session,
                mirror,
                dispatcher,
            }),
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Initial discovery.
    pub async fn start(&self) -> Result<Endpoint, CoreError> {
        self.discover().await
    }

    /// Manual rediscovery, announced with a banner in the console log.
    pub async fn reconnect(&self) -> Result<Endpoint, CoreError> {
        let log = &self.inner.log;
        log.system("===== Connection Attempt Started =====");
        log.system("Attempting to reconnect to server...");
        log.system("Checking available ports...");
        self.discover().await
    }

    /// Run a discovery cycle, superseding any cycle already in flight.
    ///
    /// On success the endpoint and status snapshot are replaced and the
    /// event stream is (re)connected. A stream that fails to open leaves
    /// the endpoint in place; the failure is in the log. When discovery
    /// gives up, the stale endpoint is dropped and the stream closed.
    pub async fn discover(&self) -> Result<Endpoint, CoreError> {
        let result = {
            let _cycle = CycleGuard::enter(&self.inner.discovering);
            self.inner.discovery.discover().await
        };

        let probed = match result {
            Ok(probed) => probed,
            Err(e @ CoreError::DiscoveryFailed { .. }) => {
                self.inner.supervisor.close().await;
                self.inner.endpoint.store(None);
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let endpoint = probed.endpoint;
        info!(endpoint = %endpoint, "backend endpoint confirmed");
        self.inner.endpoint.store(Some(Arc::new(endpoint.clone())));
        self.inner.mirror.replace(probed.snapshot);

        if let Err(e) = self.inner.supervisor.connect(&endpoint).await {
            warn!(error = %e, "event stream unavailable");
        }
        Ok(endpoint)
    }

    /// Close the stream, cancel discovery and pending refreshes.
    pub async fn shutdown(&self) {
        self.inner.discovery.cancel();
        self.inner.dispatcher.shutdown();
        self.inner.supervisor.close().await;
        debug!("orchestrator shut down");
    }

    pub fn connection_state(&self) -> ConnectionState {
        if self.inner.discovering.load(Ordering::Acquire) > 0 {
            return ConnectionState::Discovering;
        }
        match (self.inner.endpoint.load().is_some(), self.inner.supervisor.state()) {
            (true, StreamState::Open) => ConnectionState::Connected,
            (true, _) => ConnectionState::Reachable,
            (false, _) => ConnectionState::Disconnected,
        }
    }

    pub fn endpoint(&self) -> Option<Arc<Endpoint>> {
        self.inner.endpoint.load_full()
    }

    pub fn connection_info(&self) -> Option<ConnectionInfo> {
        self.endpoint().map(|e| e.connection_info())
    }

    pub fn stream_state(&self) -> StreamState {
        self.inner.supervisor.state()
    }

    pub fn subscribe_stream_state(&self) -> watch::Receiver<StreamState> {
        self.inner.supervisor.subscribe_state()
    }

    pub fn subscribe_connectivity(&self) -> watch::Receiver<bool> {
        self.inner.supervisor.subscribe_connectivity()
    }

    // ── Session ──────────────────────────────────────────────────────

    pub async fn login(&self, username: &str, password: &SecretString) -> Result<Identity, CoreError> {
        self.inner.dispatcher.login(username, password).await
    }

    pub async fn register(&self, registration: &Registration) -> Result<Identity, CoreError> {
        self.inner.dispatcher.register(registration).await
    }

    /// Returns whether a session was active.
    pub fn logout(&self) -> bool {
        self.inner.dispatcher.logout()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.session.current().map(|c| c.identity.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.session.is_authenticated()
    }

    /// Fail with `AuthRequired` (and raise the prompt) when signed out.
    pub fn ensure_authenticated(&self) -> Result<Identity, CoreError> {
        self.inner
            .dispatcher
            .require_auth("Please log in.")
            .map(|credential| credential.identity.clone())
    }

    pub fn subscribe_session(&self) -> watch::Receiver<Option<Identity>> {
        self.inner.session.subscribe()
    }

    pub fn subscribe_auth_prompt(&self) -> watch::Receiver<bool> {
        self.inner.dispatcher.subscribe_auth_prompt()
    }

    pub fn auth_prompt_open(&self) -> bool {
        self.inner.dispatcher.auth_prompt_open()
    }

    pub fn dismiss_auth_prompt(&self) {
        self.inner.dispatcher.dismiss_auth_prompt();
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub async fn send(&self, op: Operation) -> Result<CommandResult, CoreError> {
        self.inner.dispatcher.send(op).await
    }

    /// Run a script and return its output.
    pub async fn execute(&self, script: impl Into<String>) -> Result<String, CoreError> {
        match self
            .send(Operation::Execute {
                script: script.into(),
            })
            .await?
        {
            CommandResult::Executed { output } => Ok(output),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn inject(&self, process_name: impl Into<String>) -> Result<CommandResult, CoreError> {
        self.send(Operation::Inject {
            process_name: process_name.into(),
        })
        .await
    }

    pub async fn spoof_hwid(&self, custom_hwid: Option<String>) -> Result<CommandResult, CoreError> {
        self.send(Operation::SpoofHwid { custom_hwid }).await
    }

    pub async fn toggle_feature(
        &self,
        name: impl Into<String>,
        enabled: bool,
    ) -> Result<CommandResult, CoreError> {
        self.send(Operation::ToggleFeature {
            name: name.into(),
            enabled,
        })
        .await
    }

    pub async fn list_features(&self) -> Result<Vec<Feature>, CoreError> {
        match self.send(Operation::ListFeatures).await? {
            CommandResult::Features { features } => Ok(features),
            other => Err(unexpected(&other)),
        }
    }

    // ── State observation ────────────────────────────────────────────

    pub fn status(&self) -> Option<Arc<StatusSnapshot>> {
        self.inner.mirror.current()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<Option<Arc<StatusSnapshot>>> {
        self.inner.mirror.subscribe()
    }

    pub fn log(&self) -> &LogSink {
        &self.inner.log
    }

    pub fn subscribe_log(&self) -> broadcast::Receiver<LogLine> {
        self.inner.log.subscribe()
    }
}

/// Marks a discovery cycle as in flight for as long as it lives.
struct CycleGuard<'a>(&'a AtomicUsize);

impl<'a> CycleGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

fn unexpected(result: &CommandResult) -> CoreError {
    CoreError::Internal(format!("unexpected command result: {result:?}"))
}

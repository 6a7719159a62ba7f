// ── Command dispatcher ──
//
// Preconditions are checked in a fixed order before any network I/O:
// local validation, then a credential, then a discovered endpoint. A 401
// from any authenticated route clears the session and raises the
// authentication prompt. State-changing operations schedule one status
// re-probe of the current endpoint; its result replaces the mirror.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use secrecy::SecretString;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use execlink_api::models::AuthResponse;
use execlink_api::{BackendClient, Registration};

use super::{CommandResult, Operation, validate_login, validate_registration};
use crate::error::CoreError;
use crate::log::LogSink;
use crate::mirror::StatusMirror;
use crate::model::{Credential, Endpoint, Feature, Identity};
use crate::prober::Prober;
use crate::session::SessionStore;

pub struct CommandDispatcher<P: Prober> {
    http: reqwest::Client,
    prober: Arc<P>,
    endpoint: Arc<ArcSwapOption<Endpoint>>,
    session: Arc<SessionStore>,
    mirror: Arc<StatusMirror>,
    auth_prompt: watch::Sender<bool>,
    refresh: CancellationToken,
    log: LogSink,
}

impl<P: Prober> CommandDispatcher<P> {
    pub fn new(
        http: reqwest::Client,
        prober: Arc<P>,
        endpoint: Arc<ArcSwapOption<Endpoint>>,
        session: Arc<SessionStore>,
        mirror: Arc<StatusMirror>,
        log: LogSink,
    ) -> Self {
        let (auth_prompt, _) = watch::channel(false);
        Self {
            http,
            prober,
            endpoint,
            session,
            mirror,
            auth_prompt,
            refresh: CancellationToken::new(),
            log,
        }
    }

    // ── Authenticated operations ─────────────────────────────────────

    pub async fn send(&self, op: Operation) -> Result<CommandResult, CoreError> {
        if let Err(e) = op.validate() {
            self.log.error(e.to_string());
            return Err(e);
        }

        let credential = self.require_auth(&format!("Please log in to {}.", op.action()))?;

        let endpoint = self.require_endpoint(&format!("Cannot {}.", op.action()))?;
        let client = self.client(&endpoint);

        match self.perform(&client, &credential.token, &op).await {
            Ok(result) => {
                if op.is_state_changing() {
                    self.schedule_refresh(endpoint);
                }
                Ok(result)
            }
            Err(CoreError::AuthRequired) => {
                self.reject_credential();
                Err(CoreError::AuthRequired)
            }
            Err(e @ CoreError::ApplicationError { .. }) => {
                self.log.error(e.to_string());
                Err(e)
            }
            Err(e) => {
                self.log.error(format!("Failed to {}: {e}", op.action()));
                Err(e)
            }
        }
    }

    async fn perform(
        &self,
        client: &BackendClient,
        token: &SecretString,
        op: &Operation,
    ) -> Result<CommandResult, CoreError> {
        match op {
            Operation::Execute { script } => {
                self.log.system("Executing script...");
                let resp = client.execute(token, script).await?;
                if let Some(error) = resp.error.filter(|e| !e.is_empty()) {
                    return Err(CoreError::ApplicationError { message: error });
                }
                let output = if resp.output.is_empty() {
                    "Script executed successfully".to_owned()
                } else {
                    resp.output
                };
                self.log.execution(output.clone());
                Ok(CommandResult::Executed { output })
            }

            Operation::Inject { process_name } => {
                let resp = client.inject(token, process_name.trim()).await?;
                ensure_success(resp.success, &resp.message)?;
                self.log.system(resp.message.clone());
                Ok(CommandResult::Injected {
                    message: resp.message,
                    pid: resp.pid,
                })
            }

            Operation::SpoofHwid { custom_hwid } => {
                let resp = client
                    .spoof_hwid(token, custom_hwid.as_deref().unwrap_or_default())
                    .await?;
                ensure_success(resp.success, &resp.message)?;
                self.log.system(resp.message.clone());
                self.log.system(format!(
                    "Original HWID: {}",
                    resp.original_hwid.as_deref().unwrap_or("unknown")
                ));
                self.log.system(format!(
                    "New HWID: {}",
                    resp.current_hwid.as_deref().unwrap_or("unknown")
                ));
                Ok(CommandResult::Spoofed {
                    message: resp.message,
                    original_id: resp.original_hwid,
                    current_id: resp.current_hwid,
                })
            }

            Operation::ToggleFeature { name, enabled } => {
                let resp = client.set_feature(token, name, *enabled).await?;
                ensure_success(resp.success, &resp.message)?;
                self.log.system(resp.message.clone());
                Ok(CommandResult::FeatureToggled {
                    name: name.clone(),
                    enabled: *enabled,
                    message: resp.message,
                })
            }

            Operation::ListFeatures => {
                let resp = client.list_features(token).await?;
                ensure_success(resp.success, &resp.message)?;
                Ok(CommandResult::Features {
                    features: resp.features.into_iter().map(Feature::from).collect(),
                })
            }
        }
    }

    // ── Session lifecycle ────────────────────────────────────────────

    pub async fn login(&self, username: &str, password: &SecretString) -> Result<Identity, CoreError> {
        validate_login(username, password).inspect_err(|e| self.log.error(e.to_string()))?;
        let username = username.trim();

        let endpoint = self.require_endpoint("Cannot log in.")?;
        let resp = self
            .client(&endpoint)
            .login(username, password)
            .await
            .map_err(|e| self.auth_server_failure(e))?;

        self.accept_auth(resp, username, "Logged in as")
    }

    pub async fn register(&self, registration: &Registration) -> Result<Identity, CoreError> {
        validate_registration(registration).inspect_err(|e| self.log.error(e.to_string()))?;
        let username = registration.username.trim();

        let endpoint = self.require_endpoint("Cannot register.")?;
        let resp = self
            .client(&endpoint)
            .register(registration)
            .await
            .map_err(|e| self.auth_server_failure(e))?;

        self.accept_auth(resp, username, "Registered and logged in as")
    }

    /// Forget the local session. The backend keeps no logout state.
    pub fn logout(&self) -> bool {
        let had = self.session.clear();
        self.log.system("Logged out successfully");
        had
    }

    fn accept_auth(
        &self,
        resp: AuthResponse,
        username: &str,
        verb: &str,
    ) -> Result<Identity, CoreError> {
        if !resp.success {
            let message = if resp.message.is_empty() {
                "Authentication rejected".to_owned()
            } else {
                resp.message
            };
            self.log.error(message.clone());
            return Err(CoreError::ApplicationError { message });
        }

        let Some(token) = resp.token.filter(|t| !t.is_empty()) else {
            let err = CoreError::ApplicationError {
                message: "Authentication succeeded but no token was issued".into(),
            };
            self.log.error(err.to_string());
            return Err(err);
        };

        let identity = resp.user.map_or_else(
            || Identity {
                username: username.to_owned(),
                email: String::new(),
                created_at: None,
                last_login: None,
            },
            Identity::from,
        );

        if let Err(e) = self
            .session
            .set_credential(Credential::new(token, identity.clone()))
        {
            warn!(error = %e, "session not persisted; it will not survive a restart");
        }
        self.auth_prompt.send_replace(false);
        self.log.system(format!("{verb} {}", identity.username));
        Ok(identity)
    }

    fn reject_credential(&self) {
        self.session.clear();
        self.log
            .error("Authentication failed. Please log in again.");
        self.auth_prompt.send_replace(true);
    }

    fn auth_server_failure(&self, err: execlink_api::Error) -> CoreError {
        let err = CoreError::from(err);
        self.log.error(format!(
            "Failed to connect to authentication server: {err}"
        ));
        err
    }

    // ── Authentication prompt ────────────────────────────────────────

    /// The current credential, or `AuthRequired` with the prompt raised.
    pub fn require_auth(&self, context: &str) -> Result<Arc<Credential>, CoreError> {
        self.session.current().ok_or_else(|| {
            self.log
                .error(format!("Authentication required. {context}"));
            self.auth_prompt.send_replace(true);
            CoreError::AuthRequired
        })
    }

    /// `true` while the user needs to (re-)authenticate.
    pub fn subscribe_auth_prompt(&self) -> watch::Receiver<bool> {
        self.auth_prompt.subscribe()
    }

    pub fn auth_prompt_open(&self) -> bool {
        *self.auth_prompt.borrow()
    }

    pub fn dismiss_auth_prompt(&self) {
        self.auth_prompt.send_replace(false);
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn require_endpoint(&self, context: &str) -> Result<Arc<Endpoint>, CoreError> {
        self.endpoint.load_full().ok_or_else(|| {
            self.log
                .error(format!("Server not connected. {context}"));
            CoreError::Unreachable {
                reason: "no backend has been discovered".into(),
            }
        })
    }

    fn client(&self, endpoint: &Endpoint) -> BackendClient {
        BackendClient::with_client(self.http.clone(), endpoint.base_url().clone())
    }

    /// Re-probe `endpoint` in the background and publish the result, unless
    /// a rediscovery has moved to another endpoint in the meantime.
    fn schedule_refresh(&self, endpoint: Arc<Endpoint>) {
        let cancel = self.refresh.child_token();
        let prober = Arc::clone(&self.prober);
        let current = Arc::clone(&self.endpoint);
        let mirror = Arc::clone(&self.mirror);
        let log = self.log.clone();

        tokio::spawn(async move {
            let candidate = endpoint.candidate();
            tokio::select! {
                biased;
                () = cancel.cancelled() => debug!("status refresh cancelled"),
                outcome = prober.probe(&candidate) => match outcome {
                    Ok(probed) => {
                        let still_current =
                            || current.load().as_deref() == Some(endpoint.as_ref());
                        if !mirror.replace_if(probed.snapshot, still_current) {
                            debug!(endpoint = %endpoint, "dropping refresh for superseded endpoint");
                        }
                    }
                    Err(e) => log.error(format!("Status refresh failed: {e}")),
                },
            }
        });
    }

    /// Cancel outstanding refreshes. Later refreshes are cancelled at once.
    pub fn shutdown(&self) {
        self.refresh.cancel();
    }
}

fn ensure_success(success: bool, message: &str) -> Result<(), CoreError> {
    if success {
        return Ok(());
    }
    Err(CoreError::ApplicationError {
        message: if message.is_empty() {
            "Request failed".to_owned()
        } else {
            message.to_owned()
        },
    })
}

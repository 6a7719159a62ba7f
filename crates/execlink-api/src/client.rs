// Backend HTTP client
//
// Wraps `reqwest::Client` with URL construction, bearer-token attachment
// and uniform status handling. Authentication endpoints live in `auth.rs`
// as further inherent methods to keep this module focused on transport
// mechanics and the command surface.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{
    ExecuteRequest, ExecuteResponse, FeatureResponse, FeatureToggleRequest, InjectRequest,
    InjectResponse, PortStatus, SpoofRequest, SpoofResponse,
};

/// Raw HTTP client for one backend endpoint.
///
/// Stateless apart from the base URL: the caller owns the credential and
/// passes it per call, so a rejected token can never linger inside the
/// client after the session store has dropped it.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The endpoint base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Status ───────────────────────────────────────────────────────

    /// `GET /port-status` -- unauthenticated reachability and state probe.
    pub async fn port_status(&self) -> Result<PortStatus, Error> {
        let url = self.url("port-status")?;
        self.get(url, None).await
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// `POST /execute` with the script body.
    pub async fn execute(&self, token: &SecretString, script: &str) -> Result<ExecuteResponse, Error> {
        let url = self.url("execute")?;
        self.post(url, &ExecuteRequest { script }, Some(token)).await
    }

    /// `POST /inject` targeting a process by name.
    pub async fn inject(
        &self,
        token: &SecretString,
        process_name: &str,
    ) -> Result<InjectResponse, Error> {
        let url = self.url("inject")?;
        self.post(url, &InjectRequest { process_name }, Some(token))
            .await
    }

    /// `POST /spoof-hwid`. An empty `custom_hwid` lets the backend pick one.
    pub async fn spoof_hwid(
        &self,
        token: &SecretString,
        custom_hwid: &str,
    ) -> Result<SpoofResponse, Error> {
        let url = self.url("spoof-hwid")?;
        self.post(url, &SpoofRequest { custom_hwid }, Some(token))
            .await
    }

    /// `POST /features` to enable or disable one feature.
    pub async fn set_feature(
        &self,
        token: &SecretString,
        name: &str,
        enabled: bool,
    ) -> Result<FeatureResponse, Error> {
        let url = self.url("features")?;
        self.post(url, &FeatureToggleRequest { name, enabled }, Some(token))
            .await
    }

    /// `GET /features` -- the backend's current feature list.
    pub async fn list_features(&self, token: &SecretString) -> Result<FeatureResponse, Error> {
        let url = self.url("features")?;
        self.get(url, Some(token)).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        token: Option<&SecretString>,
    ) -> Result<T, Error> {
        debug!("GET {}", url);

        let builder = apply_token(self.http.get(url), token);
        let resp = builder.send().await.map_err(Error::Transport)?;

        parse_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
        token: Option<&SecretString>,
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let builder = apply_token(self.http.post(url).json(body), token);
        let resp = builder.send().await.map_err(Error::Transport)?;

        parse_response(resp).await
    }
}

/// The backend expects the bare token in `Authorization`, no scheme prefix.
fn apply_token(
    builder: reqwest::RequestBuilder,
    token: Option<&SecretString>,
) -> reqwest::RequestBuilder {
    match token {
        Some(token) => builder.header(reqwest::header::AUTHORIZATION, token.expose_secret()),
        None => builder,
    }
}

/// Map status codes onto [`Error`] and decode the JSON body.
///
/// `401` is the only credential-expiry signal; every other non-success
/// status is reported with a truncated body for diagnostics.
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Unauthorized);
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Status {
            status: status.as_u16(),
            body: preview(&body).to_owned(),
        });
    }

    let body = resp.text().await.map_err(Error::Transport)?;
    trace!(len = body.len(), "response body received");

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body,
    })
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

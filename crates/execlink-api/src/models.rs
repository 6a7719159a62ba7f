// Backend wire types
//
// Request and response bodies for the console backend's JSON API. The
// backend is lenient about field presence (zero values, `null` slices,
// ports sent as strings), so most fields carry `#[serde(default)]`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ── Status probe ─────────────────────────────────────────────────────

/// Body of `GET /port-status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortStatus {
    /// HTTP port the backend is serving on. Sent as a string.
    #[serde(default, deserialize_with = "string_or_number")]
    pub port: String,
    /// Backend-reported port state: `"connecting"`, `"connected"`, `"failed"`.
    #[serde(default)]
    pub status: String,
    /// Auxiliary raw-socket port.
    #[serde(default)]
    pub tcp_port: u16,
    #[serde(default)]
    pub injector_status: InjectorStatus,
    #[serde(default)]
    pub hwid: HwidStatus,
}

/// Injection state as reported inside the status probe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InjectorStatus {
    #[serde(default)]
    pub injected: bool,
    #[serde(rename = "injectedPID", default)]
    pub injected_pid: i64,
    /// Zero time (`0001-01-01T00:00:00Z`) when never injected.
    #[serde(rename = "injectedAt", default)]
    pub injected_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub features: Vec<Feature>,
}

/// Device-identity state as reported inside the status probe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HwidStatus {
    #[serde(rename = "originalHWID", default)]
    pub original_hwid: String,
    #[serde(rename = "currentHWID", default)]
    pub current_hwid: String,
    #[serde(default)]
    pub spoofed: bool,
}

/// A toggleable backend feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
}

// ── Authentication ───────────────────────────────────────────────────

/// Identity record returned by `/login` and `/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
    #[serde(rename = "acceptTOS")]
    pub accept_tos: bool,
}

/// Shared body of `/login` and `/register`.
///
/// Rejections arrive as HTTP 200 with `success: false` and a message.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct ExecuteRequest<'a> {
    pub script: &'a str,
}

/// Body of `/execute`. A non-empty `error` is an application-level failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteResponse {
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InjectRequest<'a> {
    pub process_name: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InjectResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub pid: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SpoofRequest<'a> {
    #[serde(rename = "customHWID")]
    pub custom_hwid: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpoofResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "originalHWID", default)]
    pub original_hwid: Option<String>,
    #[serde(rename = "currentHWID", default)]
    pub current_hwid: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FeatureToggleRequest<'a> {
    pub name: &'a str,
    pub enabled: bool,
}

/// Body of `/features` for both the toggle (`POST`) and listing (`GET`).
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub features: Vec<Feature>,
}

// ── Lenient field helpers ────────────────────────────────────────────

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected port as string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn port_status_parses_backend_shape() {
        let raw = json!({
            "port": "8082",
            "status": "connected",
            "tcpPort": 9000,
            "injectorStatus": {
                "injected": true,
                "injectedPID": 4242,
                "injectedAt": "2025-03-01T10:00:00Z",
                "features": [
                    { "name": "hwid_spoofer", "description": "Spoofs hardware ID", "enabled": true }
                ]
            },
            "hwid": { "originalHWID": "AAA", "currentHWID": "BBB", "spoofed": true }
        });

        let status: PortStatus = serde_json::from_value(raw).unwrap();
        assert_eq!(status.port, "8082");
        assert_eq!(status.tcp_port, 9000);
        assert!(status.injector_status.injected);
        assert_eq!(status.injector_status.injected_pid, 4242);
        assert_eq!(status.injector_status.features.len(), 1);
        assert_eq!(status.hwid.current_hwid, "BBB");
        assert!(status.hwid.spoofed);
    }

    #[test]
    fn port_status_tolerates_null_features_and_numeric_port() {
        let raw = json!({
            "port": 8080,
            "status": "connected",
            "tcpPort": 9000,
            "injectorStatus": {
                "injected": false,
                "injectedPID": 0,
                "injectedAt": "0001-01-01T00:00:00Z",
                "features": null
            },
            "hwid": { "originalHWID": "AAA", "currentHWID": "AAA", "spoofed": false }
        });

        let status: PortStatus = serde_json::from_value(raw).unwrap();
        assert_eq!(status.port, "8080");
        assert!(status.injector_status.features.is_empty());
    }

    #[test]
    fn register_request_uses_backend_field_names() {
        let req = RegisterRequest {
            username: "alice",
            email: "alice@example.com",
            password: "hunter22!",
            confirm_password: "hunter22!",
            accept_tos: true,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["confirmPassword"], "hunter22!");
        assert_eq!(value["acceptTOS"], true);
    }

    #[test]
    fn auth_response_rejection_has_no_token() {
        let resp: AuthResponse = serde_json::from_value(json!({
            "success": false,
            "message": "Invalid username or password"
        }))
        .unwrap();
        assert!(!resp.success);
        assert!(resp.token.is_none());
        assert!(resp.user.is_none());
    }
}

// ── Core error types ──
//
// The orchestrator's error taxonomy. Consumers never see reqwest or
// tungstenite errors directly: `From<execlink_api::Error>` collapses the
// transport layer into the coarse categories below. A 401 is treated the
// same whether the token expired or was never valid, and every other
// non-2xx status is a `ServerError` regardless of cause.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connectivity ─────────────────────────────────────────────────
    #[error("Backend unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("Failed to connect after {attempts} attempts. Server is not running.")]
    DiscoveryFailed { attempts: u32 },

    #[error("Event stream closed: {reason}")]
    StreamClosed { reason: String },

    /// A discovery cycle was superseded by a newer one or by shutdown.
    #[error("Discovery cycle cancelled")]
    Cancelled,

    // ── Session ──────────────────────────────────────────────────────
    #[error("Authentication required")]
    AuthRequired,

    // ── Responses ────────────────────────────────────────────────────
    #[error("Server responded with status: {status}")]
    ServerError { status: u16 },

    /// The backend accepted the request but reported a failure in the body.
    #[error("{message}")]
    ApplicationError { message: String },

    // ── Local checks ─────────────────────────────────────────────────
    #[error("{message}")]
    ValidationError { message: String },

    #[error("Session persistence failed: {message}")]
    Persistence { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<execlink_api::Error> for CoreError {
    fn from(err: execlink_api::Error) -> Self {
        use execlink_api::Error as Api;

        match err {
            Api::Unauthorized => CoreError::AuthRequired,
            Api::Status { status, .. } => CoreError::ServerError { status },
            Api::Transport(ref e) => match e.status() {
                Some(status) => CoreError::ServerError {
                    status: status.as_u16(),
                },
                None => CoreError::Unreachable {
                    reason: e.to_string(),
                },
            },
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::WebSocketConnect(reason) => CoreError::StreamClosed { reason },
            Api::WebSocketClosed { code, reason } => CoreError::StreamClosed {
                reason: format!("code {code}: {reason}"),
            },
            Api::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

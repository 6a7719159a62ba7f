use thiserror::Error;

/// Top-level error type for the `execlink-api` crate.
///
/// Covers every failure mode of the backend surface: HTTP commands,
/// the status probe, and the event stream. `execlink-core` maps these
/// into the orchestrator's error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The backend answered `401`. Expired and invalid tokens look the same.
    #[error("Unauthorized -- re-authentication required")]
    Unauthorized,

    // ── HTTP ────────────────────────────────────────────────────────
    /// Any other non-success HTTP status.
    #[error("Backend responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// The backend closed the event stream with a non-normal close code.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

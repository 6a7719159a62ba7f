//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a fixed process exit code.

use miette::Diagnostic;
use thiserror::Error;

use execlink_config::ConfigError;
use execlink_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(execlink::not_running),
        help(
            "Start the backend, or point at it with --host / --port.\n\
             Check the candidate range with: execlink config show"
        )
    )]
    NotRunning { message: String },

    #[error("Backend unreachable: {reason}")]
    #[diagnostic(
        code(execlink::unreachable),
        help("Run: execlink status")
    )]
    Unreachable { reason: String },

    #[error("Timed out: {reason}")]
    #[diagnostic(
        code(execlink::timeout),
        help("Raise connection.probe_timeout_ms or connection.request_timeout_secs in the config.")
    )]
    Timeout { reason: String },

    #[error("Event stream closed: {reason}")]
    #[diagnostic(code(execlink::stream_closed))]
    StreamClosed { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication required")]
    #[diagnostic(
        code(execlink::auth_required),
        help("Run: execlink login")
    )]
    AuthRequired,

    // ── Backend ──────────────────────────────────────────────────────
    #[error("Server responded with status: {status}")]
    #[diagnostic(code(execlink::server_error))]
    ServerError { status: u16 },

    #[error("{message}")]
    #[diagnostic(code(execlink::rejected))]
    Rejected { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("{reason}")]
    #[diagnostic(code(execlink::validation))]
    Validation { reason: String },

    // ── Configuration / local state ──────────────────────────────────
    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(execlink::config),
        help("Inspect it with: execlink config show")
    )]
    Config { message: String },

    #[error("Session storage failed: {message}")]
    #[diagnostic(
        code(execlink::session_storage),
        help("Switch backends with session.backend = \"file\" | \"keyring\" | \"memory\".")
    )]
    Persistence { message: String },

    #[error("Prompt failed: {0}")]
    #[diagnostic(
        code(execlink::prompt),
        help("Pass the value as an argument when not running in a terminal.")
    )]
    Prompt(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(execlink::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotRunning { .. } | Self::Unreachable { .. } | Self::StreamClosed { .. } => {
                exit_code::CONNECTION
            }
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthRequired => exit_code::AUTH,
            Self::Validation { .. } | Self::Prompt(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            e @ CoreError::DiscoveryFailed { .. } => CliError::NotRunning {
                message: e.to_string(),
            },
            CoreError::Unreachable { reason } if reason.contains("timed out") => {
                CliError::Timeout { reason }
            }
            CoreError::Unreachable { reason } => CliError::Unreachable { reason },
            CoreError::StreamClosed { reason } => CliError::StreamClosed { reason },
            CoreError::Cancelled => CliError::Internal("discovery was cancelled".into()),
            CoreError::AuthRequired => CliError::AuthRequired,
            CoreError::ServerError { status } => CliError::ServerError { status },
            CoreError::ApplicationError { message } => CliError::Rejected { message },
            CoreError::ValidationError { message } => CliError::Validation { reason: message },
            CoreError::Persistence { message } => CliError::Persistence { message },
            CoreError::Config { message } => CliError::Config { message },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation {
                reason: format!("invalid {field}: {reason}"),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn discovery_failure_is_a_connection_error() {
        let err = CliError::from(CoreError::DiscoveryFailed { attempts: 3 });
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
        assert_eq!(
            err.to_string(),
            "Failed to connect after 3 attempts. Server is not running."
        );
    }

    #[test]
    fn probe_timeout_gets_timeout_code() {
        let err = CliError::from(CoreError::Unreachable {
            reason: "timed out after 2000ms".into(),
        });
        assert_eq!(err.exit_code(), exit_code::TIMEOUT);
    }

    #[test]
    fn auth_and_validation_codes() {
        assert_eq!(CliError::from(CoreError::AuthRequired).exit_code(), exit_code::AUTH);
        let err = CliError::from(CoreError::ValidationError {
            message: "Please enter a process name".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
        assert_eq!(err.to_string(), "Please enter a process name");
    }

    #[test]
    fn rejected_commands_keep_backend_message() {
        let err = CliError::from(CoreError::ApplicationError {
            message: "process not found".into(),
        });
        assert_eq!(err.exit_code(), exit_code::GENERAL);
        assert_eq!(err.to_string(), "process not found");
    }
}

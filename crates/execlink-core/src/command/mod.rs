// ── Command API ──
//
// Every authenticated backend call is an `Operation`. The dispatcher checks
// local preconditions, attaches the credential, and turns the response into
// a `CommandResult` or one of the `CoreError` categories.

mod dispatcher;

pub use dispatcher::CommandDispatcher;

use execlink_api::Registration;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::error::CoreError;
use crate::model::Feature;

/// Local checks for a login attempt. Run before any network I/O.
pub fn validate_login(username: &str, password: &SecretString) -> Result<(), CoreError> {
    if username.trim().is_empty() || password.expose_secret().is_empty() {
        return Err(CoreError::validation("Please fill in all required fields"));
    }
    Ok(())
}

/// Local checks for a registration. A registration that fails here never
/// reaches the backend.
pub fn validate_registration(registration: &Registration) -> Result<(), CoreError> {
    if registration.username.trim().is_empty()
        || registration.email.trim().is_empty()
        || registration.password.expose_secret().is_empty()
        || registration.confirm_password.expose_secret().is_empty()
    {
        return Err(CoreError::validation("Please fill in all required fields"));
    }
    if registration.password.expose_secret() != registration.confirm_password.expose_secret() {
        return Err(CoreError::validation("Passwords do not match"));
    }
    if !registration.accept_tos {
        return Err(CoreError::validation("You must accept the Terms of Service"));
    }
    Ok(())
}

/// An authenticated operation against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Execute { script: String },
    Inject { process_name: String },
    /// `None` (or an empty id) lets the backend generate one.
    SpoofHwid { custom_hwid: Option<String> },
    ToggleFeature { name: String, enabled: bool },
    ListFeatures,
}

impl Operation {
    /// Whether success should be followed by a status refresh.
    pub fn is_state_changing(&self) -> bool {
        matches!(
            self,
            Self::Inject { .. } | Self::SpoofHwid { .. } | Self::ToggleFeature { .. }
        )
    }

    /// Local checks that must pass before any network I/O.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::Execute { script } if script.trim().is_empty() => {
                Err(CoreError::validation("Please enter a script to execute"))
            }
            Self::Inject { process_name } if process_name.trim().is_empty() => {
                Err(CoreError::validation("Please enter a process name"))
            }
            Self::ToggleFeature { name, .. } if name.trim().is_empty() => {
                Err(CoreError::validation("Please choose a feature"))
            }
            _ => Ok(()),
        }
    }

    /// Phrase used in "Please log in to ..." and "Failed to ..." lines.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Execute { .. } => "execute scripts",
            Self::Inject { .. } => "inject",
            Self::SpoofHwid { .. } => "spoof HWID",
            Self::ToggleFeature { .. } => "toggle features",
            Self::ListFeatures => "list features",
        }
    }
}

/// Parsed outcome of a successful operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandResult {
    Executed {
        output: String,
    },
    Injected {
        message: String,
        pid: Option<i64>,
    },
    Spoofed {
        message: String,
        original_id: Option<String>,
        current_id: Option<String>,
    },
    FeatureToggled {
        name: String,
        enabled: bool,
        message: String,
    },
    Features {
        features: Vec<Feature>,
    },
}

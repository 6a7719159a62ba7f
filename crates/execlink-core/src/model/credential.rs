// ── Credential domain type ──

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// The account a bearer token authenticates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

/// Opaque bearer token plus the identity it authenticates.
///
/// The token is only exposed when attached to an outbound request or
/// written by a persistence backend.
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: SecretString,
    pub identity: Identity,
}

impl Credential {
    pub fn new(token: impl Into<String>, identity: Identity) -> Self {
        Self {
            token: SecretString::from(token.into()),
            identity,
        }
    }

    pub fn username(&self) -> &str {
        &self.identity.username
    }
}

/// Serializable form of a [`Credential`], used by persistence backends.
///
/// Field names match the fixed storage keys (`auth-token`, `user`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(rename = "auth-token")]
    pub token: String,
    pub user: Identity,
}

impl From<&Credential> for StoredSession {
    fn from(cred: &Credential) -> Self {
        Self {
            token: cred.token.expose_secret().to_owned(),
            user: cred.identity.clone(),
        }
    }
}

impl From<StoredSession> for Credential {
    fn from(stored: StoredSession) -> Self {
        Credential::new(stored.token, stored.user)
    }
}

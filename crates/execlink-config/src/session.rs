// Session persistence backends
//
// Both backends store the same two entries: the bearer token under
// `auth-token` and the identity under `user`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use execlink_core::{CoreError, MemoryPersistence, SessionPersistence, StoredSession};

use crate::{SessionBackend, SessionSettings, session_path};

const KEYRING_SERVICE: &str = "execlink";
const KEYRING_ACCOUNT: &str = "session";

fn persistence_error(action: &str, err: impl std::fmt::Display) -> CoreError {
    CoreError::Persistence {
        message: format!("{action}: {err}"),
    }
}

/// Build the backend named in the config.
pub fn open_session_store(settings: &SessionSettings) -> Box<dyn SessionPersistence> {
    match settings.backend {
        SessionBackend::File => Box::new(FileSessionStore::new(
            settings.path.clone().unwrap_or_else(session_path),
        )),
        SessionBackend::Keyring => Box::new(KeyringSessionStore::default()),
        SessionBackend::Memory => Box::new(MemoryPersistence::default()),
    }
}

// ── File ────────────────────────────────────────────────────────────

/// `session.toml` with owner-only permissions on Unix.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionPersistence for FileSessionStore {
    fn load(&self) -> Result<Option<StoredSession>, CoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(persistence_error("reading session file", e)),
        };
        let session = toml::from_str(&raw).map_err(|e| persistence_error("parsing session file", e))?;
        debug!(path = %self.path.display(), "session file loaded");
        Ok(Some(session))
    }

    fn save(&self, session: &StoredSession) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| persistence_error("creating session directory", e))?;
        }
        let raw = toml::to_string_pretty(session)
            .map_err(|e| persistence_error("serializing session", e))?;
        std::fs::write(&self.path, raw).map_err(|e| persistence_error("writing session file", e))?;
        restrict_permissions(&self.path)?;
        Ok(())
    }

    fn delete(&self) -> Result<(), CoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(persistence_error("removing session file", e)),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), CoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| persistence_error("restricting session file permissions", e))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), CoreError> {
    Ok(())
}

// ── Keyring ─────────────────────────────────────────────────────────

/// One OS credential-store entry holding the session as JSON.
#[derive(Debug, Clone)]
pub struct KeyringSessionStore {
    service: String,
    account: String,
}

impl Default for KeyringSessionStore {
    fn default() -> Self {
        Self {
            service: KEYRING_SERVICE.into(),
            account: KEYRING_ACCOUNT.into(),
        }
    }
}

impl KeyringSessionStore {
    fn entry(&self) -> Result<keyring::Entry, CoreError> {
        keyring::Entry::new(&self.service, &self.account)
            .map_err(|e| persistence_error("opening keyring entry", e))
    }
}

impl SessionPersistence for KeyringSessionStore {
    fn load(&self) -> Result<Option<StoredSession>, CoreError> {
        match self.entry()?.get_password() {
            Ok(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| persistence_error("parsing keyring session", e)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(persistence_error("reading keyring", e)),
        }
    }

    fn save(&self, session: &StoredSession) -> Result<(), CoreError> {
        let raw = serde_json::to_string(session)
            .map_err(|e| persistence_error("serializing session", e))?;
        self.entry()?
            .set_password(&raw)
            .map_err(|e| persistence_error("writing keyring", e))
    }

    fn delete(&self) -> Result<(), CoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(persistence_error("clearing keyring", e)),
        }
    }
}

// ── Session store ──
//
// Holds the current credential behind an `ArcSwapOption` so readers never
// block the (single) writer. Persistence is a pluggable backend: the
// store loads once on construction, saves on every set and deletes on
// every clear. There is no local expiry; only a 401 from the backend or
// an explicit logout ends a session.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwapOption;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{Credential, Identity, StoredSession};

/// Durable home for the credential between runs.
pub trait SessionPersistence: Send + Sync {
    fn load(&self) -> Result<Option<StoredSession>, CoreError>;
    fn save(&self, session: &StoredSession) -> Result<(), CoreError>;
    fn delete(&self) -> Result<(), CoreError>;
}

/// Process-local persistence, lost on exit. Backs the `memory` session backend.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    slot: Mutex<Option<StoredSession>>,
}

impl MemoryPersistence {
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl SessionPersistence for MemoryPersistence {
    fn load(&self) -> Result<Option<StoredSession>, CoreError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, session: &StoredSession) -> Result<(), CoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn delete(&self) -> Result<(), CoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

impl<P: SessionPersistence + ?Sized> SessionPersistence for Arc<P> {
    fn load(&self) -> Result<Option<StoredSession>, CoreError> {
        (**self).load()
    }

    fn save(&self, session: &StoredSession) -> Result<(), CoreError> {
        (**self).save(session)
    }

    fn delete(&self) -> Result<(), CoreError> {
        (**self).delete()
    }
}

// ── SessionStore ─────────────────────────────────────────────────────

pub struct SessionStore {
    current: ArcSwapOption<Credential>,
    identity: watch::Sender<Option<Identity>>,
    backend: Box<dyn SessionPersistence>,
}

impl SessionStore {
    /// Create a store, restoring whatever the backend holds.
    ///
    /// A backend that fails to load is treated as empty.
    pub fn new(backend: Box<dyn SessionPersistence>) -> Self {
        let restored = match backend.load() {
            Ok(stored) => stored.map(Credential::from),
            Err(e) => {
                warn!(error = %e, "could not restore session; starting signed out");
                None
            }
        };
        if let Some(ref cred) = restored {
            debug!(username = cred.username(), "session restored");
        }

        let (identity, _) = watch::channel(restored.as_ref().map(|c| c.identity.clone()));
        Self {
            current: ArcSwapOption::from(restored.map(Arc::new)),
            identity,
            backend,
        }
    }

    /// Replace the credential and persist it.
    ///
    /// The in-memory session takes effect even if persisting fails; the
    /// error is returned so the caller can report it.
    pub fn set_credential(&self, credential: Credential) -> Result<(), CoreError> {
        let stored = StoredSession::from(&credential);
        let identity = credential.identity.clone();
        self.current.store(Some(Arc::new(credential)));
        self.identity.send_replace(Some(identity));
        self.backend.save(&stored)
    }

    /// Drop the credential from memory and from the backend.
    ///
    /// Returns whether a credential was present.
    pub fn clear(&self) -> bool {
        let had = self.current.swap(None).is_some();
        self.identity.send_replace(None);
        if let Err(e) = self.backend.delete() {
            warn!(error = %e, "could not delete persisted session");
        }
        had
    }

    pub fn current(&self) -> Option<Arc<Credential>> {
        self.current.load_full()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.load().is_some()
    }

    /// Watch sign-in / sign-out transitions.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

// ── Status mirror ──
//
// Last server-confirmed `StatusSnapshot`. Written only after a successful
// probe (discovery or post-command refresh); nothing is ever patched in
// place, so readers always see one complete response.

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::StatusSnapshot;

#[derive(Debug)]
pub struct StatusMirror {
    tx: watch::Sender<Option<Arc<StatusSnapshot>>>,
}

impl Default for StatusMirror {
    fn default() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }
}

impl StatusMirror {
    pub fn replace(&self, snapshot: StatusSnapshot) {
        self.tx.send_replace(Some(Arc::new(snapshot)));
    }

    /// Replace the snapshot only if `still_current` holds. The check runs
    /// under the channel lock, so a concurrent `replace` cannot be undone by
    /// a stale writer. Returns whether the snapshot was published.
    pub fn replace_if(&self, snapshot: StatusSnapshot, still_current: impl FnOnce() -> bool) -> bool {
        self.tx.send_if_modified(|slot| {
            if !still_current() {
                return false;
            }
            *slot = Some(Arc::new(snapshot));
            true
        })
    }

    pub fn current(&self) -> Option<Arc<StatusSnapshot>> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<StatusSnapshot>>> {
        self.tx.subscribe()
    }
}

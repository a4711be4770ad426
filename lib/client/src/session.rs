//! Process-wide cell holding the signed-in identity.

use tokio::sync::watch;

use crate::model::Identity;

/// Shared handle to the current authenticated identity.
///
/// One store per application, created at startup and cloned into every
/// component that needs to know who is signed in. It is a plain cell:
/// reads are synchronous and never stale, writes replace the value
/// wholesale, and there are no error conditions. [`subscribe`] yields a
/// receiver that wakes on sign-in and sign-out, so nothing has to poll.
///
/// [`subscribe`]: SessionStore::subscribe
#[derive(Clone)]
pub struct SessionStore {
    tx: watch::Sender<Option<Identity>>,
}

impl SessionStore {
    /// New anonymous store.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Currently signed-in identity, if any.
    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Replace the identity wholesale. `None` signs out.
    pub fn set(&self, identity: Option<Identity>) {
        self.tx.send_replace(identity);
    }

    /// Sign out. Immediately visible to every holder of this store.
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Observe sign-in/sign-out transitions.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

mod store;

pub use store::{SessionFile, SessionStore, StoredSession};
#[cfg(test)]
pub use store::MockSessionStore;

use crate::api::{Admin, LoginResponse};
use anyhow::anyhow;
use log::{error, info, warn};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub admin: Option<Admin>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn display_name(&self) -> String {
        self.admin
            .as_ref()
            .and_then(|a| a.name.clone().filter(|n| !n.is_empty()).or(Some(a.email.clone())))
            .unwrap_or_else(|| "Administrator".to_string())
    }
}

impl From<StoredSession> for SessionSnapshot {
    fn from(stored: StoredSession) -> Self {
        SessionSnapshot {
            token: stored.token,
            admin: stored.admin,
        }
    }
}

/// Shared handle on the logged-in session.
///
/// Readers take a [`SessionSnapshot`]; the only writes are [`login`](Self::login),
/// [`logout`](Self::logout) and [`invalidate`](Self::invalidate). Every write is persisted
/// before it is published to subscribers.
pub struct SessionContext<S> {
    store: Arc<Mutex<S>>,
    state: Arc<watch::Sender<SessionSnapshot>>,
}

impl<S> Clone for SessionContext<S> {
    fn clone(&self) -> Self {
        SessionContext {
            store: Arc::clone(&self.store),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: SessionStore> SessionContext<S> {
    pub fn restore(mut store: S) -> anyhow::Result<Self> {
        let snapshot = SessionSnapshot::from(store.load()?);
        if snapshot.is_authenticated() {
            info!("Restored stored session for {}", snapshot.display_name());
        }
        let (state, _) = watch::channel(snapshot);
        Ok(SessionContext {
            store: Arc::new(Mutex::new(store)),
            state: Arc::new(state),
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn login(&self, response: LoginResponse) -> anyhow::Result<()> {
        self.store
            .lock()
            .map_err(|_| anyhow!("session store lock poisoned"))?
            .save(&response.token, &response.admin)?;
        info!("Logged in as {}", response.admin.email);
        self.state.send_replace(SessionSnapshot {
            token: Some(response.token),
            admin: Some(response.admin),
        });
        Ok(())
    }

    pub fn logout(&self) -> anyhow::Result<()> {
        self.store
            .lock()
            .map_err(|_| anyhow!("session store lock poisoned"))?
            .clear()?;
        info!("Logged out");
        self.state.send_replace(SessionSnapshot::default());
        Ok(())
    }

    /// Drops the session after the server refused its token. Applies to every request.
    pub fn invalidate(&self) {
        match self.store.lock() {
            Ok(mut store) => {
                if let Err(e) = store.clear() {
                    error!("Failed to clear stored session: {e:?}");
                }
            }
            Err(_) => error!("Failed to clear stored session: lock poisoned"),
        }
        let changed = self.state.send_if_modified(|snapshot| {
            if *snapshot == SessionSnapshot::default() {
                false
            } else {
                *snapshot = SessionSnapshot::default();
                true
            }
        });
        if changed {
            warn!("Session invalidated by the server");
        }
    }
}

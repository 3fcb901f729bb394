//! Authentication state shared by every page.
//!
//! `SessionStore` is the thin persistent layer (two keys in a key/value
//! store). `SessionHandle` wraps it for the rest of the client: each
//! transition bumps a revision counter so the shell can tell when nav items
//! need to be re-derived.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use parking_lot::Mutex;

use crate::storage::{KeyValueStore, MemoryKvStore};

pub const TOKEN_KEY: &str = "token";
pub const USERNAME_KEY: &str = "username";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub username: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// True iff a token is stored right now. There is no expiry check.
    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self.token()?.is_some())
    }

    pub fn token(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(TOKEN_KEY)?
            .filter(|token| !token.is_empty()))
    }

    pub fn username(&self) -> Result<Option<String>> {
        self.store.get(USERNAME_KEY)
    }

    pub fn current(&self) -> Result<Session> {
        let token = self.token()?;
        let username = if token.is_some() {
            self.username()?
        } else {
            None
        };
        Ok(Session { token, username })
    }

    pub fn login(&self, token: &str, username: &str) -> Result<()> {
        if token.trim().is_empty() {
            bail!("refusing to store an empty session token");
        }
        self.store
            .set_many(&[(TOKEN_KEY, token), (USERNAME_KEY, username)])
    }

    pub fn logout(&self) -> Result<()> {
        self.store.remove_many(&[TOKEN_KEY, USERNAME_KEY])
    }
}

#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: SessionStore,
    revision: AtomicU64,
    transition: Mutex<()>,
}

impl SessionHandle {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                store: SessionStore::new(store),
                revision: AtomicU64::new(0),
                transition: Mutex::new(()),
            }),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKvStore::default()))
    }

    pub fn is_authenticated(&self) -> bool {
        match self.inner.store.is_authenticated() {
            Ok(authenticated) => authenticated,
            Err(err) => {
                tracing::error!(?err, "failed to read session token");
                false
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.inner.store.token().unwrap_or_else(|err| {
            tracing::error!(?err, "failed to read session token");
            None
        })
    }

    pub fn current(&self) -> Session {
        self.inner.store.current().unwrap_or_else(|err| {
            tracing::error!(?err, "failed to read session");
            Session::default()
        })
    }

    /// Monotonic counter bumped on every login, logout and invalidation.
    pub fn revision(&self) -> u64 {
        self.inner.revision.load(Ordering::Acquire)
    }

    pub fn login(&self, token: &str, username: &str) -> Result<()> {
        let _guard = self.inner.transition.lock();
        self.inner.store.login(token, username)?;
        self.bump();
        tracing::info!(%username, "session started");
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        let _guard = self.inner.transition.lock();
        self.inner.store.logout()?;
        self.bump();
        tracing::info!("session ended");
        Ok(())
    }

    /// Drops the stored credentials after the server rejected them.
    pub fn invalidate(&self, reason: &str) {
        let _guard = self.inner.transition.lock();
        if let Err(err) = self.inner.store.logout() {
            tracing::error!(?err, reason, "failed to clear rejected session");
            return;
        }
        self.bump();
        tracing::warn!(reason, "session invalidated");
    }

    fn bump(&self) {
        self.inner.revision.fetch_add(1, Ordering::AcqRel);
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}

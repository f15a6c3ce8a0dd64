//! Authentication session store
//!
//! Holds the signed-in user and token pair. The store is the only
//! process-wide mutable state: `login`, `logout` and the client's token
//! renewal are its only writers, and every change is broadcast to
//! subscribers through a `watch` channel. Changes are mirrored to local
//! storage so a session survives restarts.

use crate::core::{AuthResponse, Result, User};
use crate::db::{LocalStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::watch;

/// The signed-in user and their tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access: String,
    pub refresh: Option<String>,
    pub user: User,
}

/// Observable session container
pub struct SessionStore {
    storage: Mutex<LocalStorage>,
    tx: watch::Sender<Option<Session>>,
}

impl SessionStore {
    /// Create a store over the given storage. Starts signed out; call
    /// [`SessionStore::restore`] to pick up a persisted session.
    pub fn new(storage: LocalStorage) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            storage: Mutex::new(storage),
            tx,
        }
    }

    /// Store backed by throwaway in-memory storage
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(LocalStorage::open_in_memory()?))
    }

    /// Reload the persisted session, if any.
    ///
    /// A stored user that no longer parses clears the whole session.
    pub fn restore(&self) -> Result<Option<Session>> {
        let (access, refresh, user) = {
            let storage = self.lock_storage();
            (
                storage.get_item(ACCESS_TOKEN_KEY)?,
                storage.get_item(REFRESH_TOKEN_KEY)?,
                storage.get_item(USER_KEY)?,
            )
        };

        let (Some(access), Some(user)) = (access, user) else {
            return Ok(None);
        };

        match serde_json::from_str::<User>(&user) {
            Ok(user) => {
                let session = Session { access, refresh, user };
                log::info!("Restored session for {}", session.user.username);
                self.tx.send_replace(Some(session.clone()));
                Ok(Some(session))
            }
            Err(e) => {
                log::warn!("Stored user is unreadable, clearing session: {}", e);
                self.logout()?;
                Ok(None)
            }
        }
    }

    /// Start a session from a login response
    pub fn login(&self, auth: AuthResponse) -> Result<()> {
        let user_json = serde_json::to_string(&auth.user)?;
        {
            let storage = self.lock_storage();
            storage.set_item(ACCESS_TOKEN_KEY, &auth.access)?;
            storage.set_item(REFRESH_TOKEN_KEY, &auth.refresh)?;
            storage.set_item(USER_KEY, &user_json)?;
        }

        log::info!("Signed in as {}", auth.user.username);
        self.tx.send_replace(Some(Session {
            access: auth.access,
            refresh: Some(auth.refresh),
            user: auth.user,
        }));
        Ok(())
    }

    /// Drop the session and everything persisted for it.
    ///
    /// Subscribers are notified even if clearing storage fails.
    pub fn logout(&self) -> Result<()> {
        let cleared = {
            let storage = self.lock_storage();
            storage
                .remove_item(ACCESS_TOKEN_KEY)
                .and_then(|_| storage.remove_item(REFRESH_TOKEN_KEY))
                .and_then(|_| storage.remove_item(USER_KEY))
        };

        let previous = self.tx.send_replace(None);
        if let Some(session) = previous {
            log::info!("Signed out {}", session.user.username);
        }
        cleared
    }

    /// Swap in a renewed access token, keeping user and refresh token
    pub fn replace_access_token(&self, access: &str) -> Result<()> {
        if self.tx.borrow().is_none() {
            return Ok(());
        }

        self.lock_storage().set_item(ACCESS_TOKEN_KEY, access)?;
        self.tx.send_modify(|current| {
            if let Some(session) = current {
                session.access = access.to_string();
            }
        });
        Ok(())
    }

    /// Snapshot of the current session
    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|s| s.access.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.tx.borrow().as_ref().and_then(|s| s.refresh.clone())
    }

    /// Receive every subsequent session change
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    fn lock_storage(&self) -> std::sync::MutexGuard<'_, LocalStorage> {
        // A panic while holding the lock leaves the table consistent
        self.storage.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

//! In-memory credential holder mirrored to durable storage.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use quizgate_core::{
    AccessToken, Credential, CredentialStorage, MemoryStorage, RefreshToken, UserProfile,
};

/// Holds the client's credential.
///
/// The in-memory copy is the source of truth; every write is mirrored to the
/// [`CredentialStorage`] inside the same critical section, so readers never
/// observe a half-updated credential and storage never lags behind a later
/// write. Mirror failures are logged and do not fail the write.
///
/// Only the auth gateway writes to the store.
pub struct TokenStore {
    current: RwLock<Option<Credential>>,
    storage: Arc<dyn CredentialStorage>,
}

impl TokenStore {
    /// Load whatever the storage holds from a previous run.
    ///
    /// Unreadable or incomplete records are discarded and cleared.
    pub fn restore(storage: Arc<dyn CredentialStorage>) -> Self {
        let current = match storage.load() {
            Ok(Some(stored)) => {
                let credential = Credential::from_stored(stored);
                if credential.is_none() {
                    warn!("Discarding stored credential without a user profile");
                    Self::clear_storage(storage.as_ref());
                }
                credential
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to load stored credential, starting logged out");
                None
            }
        };

        debug!(restored = current.is_some(), "Token store ready");

        Self {
            current: RwLock::new(current),
            storage,
        }
    }

    /// A store that persists nothing beyond the process.
    pub fn in_memory() -> Self {
        Self::restore(Arc::new(MemoryStorage::new()))
    }

    /// Snapshot of the current credential.
    pub fn current(&self) -> Option<Credential> {
        self.read().clone()
    }

    pub fn access_token(&self) -> Option<AccessToken> {
        self.read().as_ref().map(|c| c.access_token().clone())
    }

    pub fn refresh_token(&self) -> Option<RefreshToken> {
        self.read().as_ref().and_then(|c| c.refresh_token().cloned())
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read().as_ref().map(|c| c.user().clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// Install a new credential.
    pub(crate) fn replace(&self, credential: Credential) {
        let mut current = self.write();
        self.mirror(&credential);
        *current = Some(credential);
    }

    /// Install `next` only if the held credential still uses `expected` as
    /// its refresh token. Returns false when the credential was replaced or
    /// cleared in the meantime.
    pub(crate) fn replace_if_refresh_token(&self, expected: &RefreshToken, next: Credential) -> bool {
        let mut current = self.write();
        let still_current = current
            .as_ref()
            .and_then(|c| c.refresh_token())
            .is_some_and(|t| t == expected);
        if still_current {
            self.mirror(&next);
            *current = Some(next);
        }
        still_current
    }

    /// Replace the user profile if `expected` is still the access token.
    pub(crate) fn update_user(&self, expected: &AccessToken, user: UserProfile) -> Option<Credential> {
        let mut current = self.write();
        let next = current
            .as_ref()
            .filter(|c| c.access_token() == expected)
            .map(|c| c.with_user(user))?;
        self.mirror(&next);
        *current = Some(next.clone());
        Some(next)
    }

    /// Drop the credential from memory and storage.
    pub(crate) fn clear(&self) {
        let mut current = self.write();
        *current = None;
        Self::clear_storage(self.storage.as_ref());
    }

    fn mirror(&self, credential: &Credential) {
        if let Err(e) = self.storage.save(&credential.to_stored()) {
            warn!(error = %e, "Failed to persist credential");
        }
    }

    fn clear_storage(storage: &dyn CredentialStorage) {
        if let Err(e) = storage.clear() {
            warn!(error = %e, "Failed to clear stored credential");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Credential>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Credential>> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("authenticated", &self.is_authenticated())
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}

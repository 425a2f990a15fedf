//! Durable credential storage.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::credentials::UserProfile;
use crate::error::StorageError;

/// The persisted shape of a credential: exactly the access token, the
/// refresh token and the serialized user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// A durable mirror of the in-memory credential.
///
/// Operations are synchronous; they are small and run inside short
/// critical sections of the token store.
pub trait CredentialStorage: Send + Sync {
    /// Load the persisted credential, if any.
    fn load(&self) -> Result<Option<StoredCredential>, StorageError>;

    /// Persist a credential, replacing any previous one.
    fn save(&self, credential: &StoredCredential) -> Result<(), StorageError>;

    /// Remove everything persisted.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Storage that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<StoredCredential>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a persisted credential, as if left by a previous run.
    pub fn with_credential(credential: StoredCredential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<StoredCredential>>, StorageError> {
        self.slot.lock().map_err(|_| StorageError::Io {
            message: "memory storage lock poisoned".to_string(),
        })
    }
}

impl CredentialStorage for MemoryStorage {
    fn load(&self) -> Result<Option<StoredCredential>, StorageError> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, credential: &StoredCredential) -> Result<(), StorageError> {
        *self.lock()? = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.lock()? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_save_load_clear() {
        let storage = MemoryStorage::new();
        assert!(storage.load().unwrap().is_none());

        let stored = StoredCredential {
            access_token: "a".into(),
            refresh_token: Some("r".into()),
            user: None,
        };
        storage.save(&stored).unwrap();
        assert_eq!(storage.load().unwrap(), Some(stored));

        storage.clear().unwrap();
        assert!(storage.load().unwrap().is_none());
    }
}

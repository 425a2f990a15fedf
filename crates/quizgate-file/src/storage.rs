//! Credential file with atomic replacement.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, instrument, trace};

use quizgate_core::{CredentialStorage, StorageError, StoredCredential};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

/// File name used by [`FileCredentialStorage::in_dir`].
pub const CREDENTIAL_FILE: &str = "credential.json";

fn map_io(err: std::io::Error) -> StorageError {
    StorageError::Io {
        message: err.to_string(),
    }
}

/// Credential storage backed by one JSON file.
///
/// Writes go to a temporary file that is renamed over the target, so a
/// reader never sees a half-written record. Every access holds an exclusive
/// lock on a sibling `.lock` file, which serializes clients sharing the same
/// data directory. On Unix the file is created with mode `0600`.
#[derive(Debug, Clone)]
pub struct FileCredentialStorage {
    path: PathBuf,
}

/// Releases the lock file when dropped.
struct LockGuard(File);

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.0.unlock() {
            trace!(error = %e, "Failed to release credential lock");
        }
    }
}

impl FileCredentialStorage {
    /// Store the credential at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store the credential as [`CREDENTIAL_FILE`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(CREDENTIAL_FILE))
    }

    /// Path of the credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    fn ensure_parent(&self) -> Result<(), StorageError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(map_io)
            }
            _ => Ok(()),
        }
    }

    fn lock(&self) -> Result<LockGuard, StorageError> {
        self.ensure_parent()?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(map_io)?;
        file.lock_exclusive().map_err(map_io)?;
        Ok(LockGuard(file))
    }

    fn open_temp(&self) -> Result<File, StorageError> {
        let mut options = OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        options.open(self.temp_path()).map_err(map_io)
    }
}

impl CredentialStorage for FileCredentialStorage {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<Option<StoredCredential>, StorageError> {
        let _lock = self.lock()?;

        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No stored credential");
                return Ok(None);
            }
            Err(e) => return Err(map_io(e)),
        };

        let stored = serde_json::from_str(&json).map_err(|e| StorageError::Format {
            message: e.to_string(),
        })?;
        Ok(Some(stored))
    }

    #[instrument(skip(self, credential), fields(path = %self.path.display()))]
    fn save(&self, credential: &StoredCredential) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(credential).map_err(|e| StorageError::Format {
            message: e.to_string(),
        })?;

        let _lock = self.lock()?;
        let mut file = self.open_temp()?;
        file.write_all(json.as_bytes()).map_err(map_io)?;
        file.sync_all().map_err(map_io)?;
        drop(file);

        fs::rename(self.temp_path(), &self.path).map_err(map_io)?;
        debug!("Credential saved");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn clear(&self) -> Result<(), StorageError> {
        let _lock = self.lock()?;
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Stored credential removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_io(e)),
        }
    }
}

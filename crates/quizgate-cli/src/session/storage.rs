//! Location of the stored login.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;

use quizgate_file::FileCredentialStorage;

/// Resolve the data directory, creating it if needed.
pub fn data_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => ProjectDirs::from("", "", "quizgate")
            .context("Could not determine data directory")?
            .data_dir()
            .to_path_buf(),
    };

    fs::create_dir_all(&dir).context("Failed to create data directory")?;
    Ok(dir)
}

/// Credential storage inside the data directory.
pub fn credential_storage(override_dir: Option<&Path>) -> Result<FileCredentialStorage> {
    Ok(FileCredentialStorage::in_dir(data_dir(override_dir)?))
}

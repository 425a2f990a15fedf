//! quizgate-file - Filesystem-backed credential storage.
//!
//! [`FileCredentialStorage`] keeps the credential in a single JSON file so a
//! login survives restarts of the client.

mod storage;

pub use storage::{CREDENTIAL_FILE, FileCredentialStorage};

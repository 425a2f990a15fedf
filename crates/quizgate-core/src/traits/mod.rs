//! Service traits implemented by the transport and storage crates.

mod assessment;
mod identity;
mod storage;

pub use assessment::AssessmentService;
pub use identity::IdentityService;
pub use storage::{CredentialStorage, MemoryStorage, StoredCredential};

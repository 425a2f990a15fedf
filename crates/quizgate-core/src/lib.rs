//! quizgate-core - Core types and traits for the quizgate assessment client.
//!
//! This crate holds everything that does not depend on a runtime or a
//! transport: validated identifiers, opaque token wrappers, the credential
//! model, the JWT expiry reader, exam models, the error taxonomy and the
//! service traits implemented by the HTTP and filesystem crates.

pub mod credentials;
pub mod error;
pub mod jwt;
pub mod models;
pub mod tokens;
pub mod traits;
pub mod types;

pub use credentials::{Credential, LoginCredentials, SignupDetails, UserProfile};
pub use error::{
    AuthError, CredentialError, Error, ExamError, InvalidInputError, ProtocolError, StorageError,
    SubmissionError, TransportError,
};
pub use models::{
    AnswerChoice, Answers, ExamResult, ExamStatus, Question, RefreshGrant, TokenGrant,
};
pub use tokens::{AccessToken, RefreshToken};
pub use traits::{
    AssessmentService, CredentialStorage, IdentityService, MemoryStorage, StoredCredential,
};
pub use types::{ApiUrl, QuestionId, SessionId, TestId};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for the quizgate client.
//!
//! One unified error type with explicit variants for transport,
//! authentication, credential, protocol, exam and storage failures. Auth
//! refresh failures never reach callers as-is: they are converted to a
//! forced logout and reported as [`AuthError::SessionExpired`].

use std::fmt;
use thiserror::Error;

use crate::models::ExamStatus;

/// The unified error type for quizgate operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout, other HTTP failures).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The session can no longer be used and the user must log in again.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Login or signup was rejected by the identity service.
    #[error("credentials rejected: {0}")]
    Credential(#[from] CredentialError),

    /// Non-success HTTP responses not covered by a more specific variant.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Submitting an exam failed; the session was returned to `active`.
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    /// Exam state machine misuse.
    #[error("exam error: {0}")]
    Exam(#[from] ExamError),

    /// Durable credential storage failures.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors (ids, URLs, payload shapes).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns true when the caller should send the user back to login.
    pub fn requires_login(&self) -> bool {
        match self {
            Error::Auth(_) => true,
            Error::Submission(e) => e.source.requires_login(),
            _ => false,
        }
    }

    /// Returns the HTTP status behind this error, if there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Protocol(e) => Some(e.status),
            Error::Auth(AuthError::SessionExpired(e)) => Some(e.status),
            Error::Credential(CredentialError::Rejected { status, .. }) => Some(*status),
            Error::Submission(e) => e.source.status(),
            _ => None,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The access token was rejected and could not be refreshed. The local
    /// credential has already been cleared.
    #[error("session expired, please log in again ({0})")]
    SessionExpired(ProtocolError),

    /// No credential is held.
    #[error("not logged in")]
    NotAuthenticated,
}

/// Login/signup failures surfaced to the user.
#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    /// The identity service refused the credentials.
    #[error("{detail} (HTTP {status})")]
    Rejected { status: u16, detail: String },

    /// The credentials were unusable before any request was made.
    #[error("{reason}")]
    Invalid { reason: String },
}

/// Protocol-level errors from HTTP responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Error detail from the server, if any.
    pub detail: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref detail) = self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, detail: Option<String>) -> Self {
        Self { status, detail }
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        self.status == 401
    }
}

/// An exam submission failed and can be retried.
#[derive(Debug, Error)]
#[error("could not submit answers: {source}")]
pub struct SubmissionError {
    /// The underlying failure.
    pub source: Box<Error>,
}

impl SubmissionError {
    /// Wrap the error that made the submit fail.
    pub fn new(source: Error) -> Self {
        Self {
            source: Box::new(source),
        }
    }
}

/// Exam state machine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExamError {
    /// The operation requires an active session.
    #[error("session is {status}, not active")]
    NotActive { status: ExamStatus },

    /// The question does not belong to this session.
    #[error("unknown question '{id}'")]
    UnknownQuestion { id: String },

    /// The selected option index is past the question's options.
    #[error("option {index} is out of range for question '{id}' ({count} options)")]
    OptionOutOfRange { id: String, index: usize, count: usize },

    /// The selected label is not one of the question's options.
    #[error("'{label}' is not an option of question '{id}'")]
    UnknownOption { id: String, label: String },
}

/// Durable storage errors.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Reading or writing the backing store failed.
    #[error("IO error: {message}")]
    Io { message: String },

    /// The stored data could not be encoded or decoded.
    #[error("malformed stored credential: {message}")]
    Format { message: String },
}

/// Input validation errors.
#[derive(Debug, Clone, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Invalid test identifier.
    #[error("invalid test id '{value}': {reason}")]
    TestId { value: String, reason: String },

    /// A response body did not have the expected shape.
    #[error("unexpected response payload: {message}")]
    Payload { message: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_expired_requires_login() {
        let err = Error::from(AuthError::SessionExpired(ProtocolError::new(401, None)));
        assert!(err.requires_login());
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn submission_error_reports_inner_status() {
        let inner = Error::from(ProtocolError::new(503, Some("maintenance".into())));
        let err = Error::from(SubmissionError::new(inner));
        assert_eq!(err.status(), Some(503));
        assert!(!err.requires_login());
        assert!(err.to_string().contains("maintenance"));
    }

    #[test]
    fn protocol_error_display() {
        let err = ProtocolError::new(422, Some("email: field required".into()));
        assert_eq!(err.to_string(), "HTTP 422: email: field required");
        assert_eq!(ProtocolError::new(500, None).to_string(), "HTTP 500");
        assert!(ProtocolError::new(401, None).is_auth_error());
    }
}

//! Login input and the held credential.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CredentialError;
use crate::tokens::{AccessToken, RefreshToken};
use crate::traits::StoredCredential;

/// Email/password pair used to log in.
///
/// # Security
///
/// The password is never exposed in Debug output.
///
/// # Example
///
/// ```
/// use quizgate_core::LoginCredentials;
///
/// let creds = LoginCredentials::new("ada@example.com", "hunter22");
/// assert_eq!(creds.email(), "ada@example.com");
/// ```
#[derive(Clone)]
pub struct LoginCredentials {
    email: String,
    password: String,
}

impl LoginCredentials {
    /// Create new credentials.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Returns the email address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the password.
    ///
    /// Use this only when constructing authentication requests.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Rejects input that could never authenticate, without a network call.
    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(CredentialError::Invalid {
                reason: "a valid email address is required".to_string(),
            });
        }
        if self.password.is_empty() {
            return Err(CredentialError::Invalid {
                reason: "password is required".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Account details for signup.
#[derive(Clone)]
pub struct SignupDetails {
    name: String,
    credentials: LoginCredentials,
}

impl SignupDetails {
    /// Create new signup details.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            credentials: LoginCredentials::new(email, password),
        }
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the credentials used for the implicit login after signup.
    pub fn credentials(&self) -> &LoginCredentials {
        &self.credentials
    }

    /// Rejects input that could never create an account.
    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.name.trim().is_empty() {
            return Err(CredentialError::Invalid {
                reason: "name is required".to_string(),
            });
        }
        self.credentials.validate()
    }
}

impl fmt::Debug for SignupDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupDetails")
            .field("name", &self.name)
            .field("credentials", &self.credentials)
            .finish()
    }
}

/// The authenticated user's profile, as returned by `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: serde_json::Value,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl UserProfile {
    /// Returns true for administrator accounts.
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }

    /// Returns the id as display text, whether the server sent a number or a string.
    pub fn id_string(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// The credential held by a running client.
///
/// A credential always carries its user: a client either has a token and
/// the profile it belongs to, or nothing.
#[derive(Debug, Clone)]
pub struct Credential {
    access_token: AccessToken,
    refresh_token: Option<RefreshToken>,
    expires_at: Option<DateTime<Utc>>,
    user: UserProfile,
}

impl Credential {
    /// Build a credential, deriving the expiry from the access token.
    pub fn new(
        access_token: AccessToken,
        refresh_token: Option<RefreshToken>,
        user: UserProfile,
    ) -> Self {
        let expires_at = access_token.expires_at();
        Self {
            access_token,
            refresh_token,
            expires_at,
            user,
        }
    }

    /// Replace the access token, keeping the refresh token unless a new one
    /// was issued.
    pub fn with_access_token(
        &self,
        access_token: AccessToken,
        refresh_token: Option<RefreshToken>,
    ) -> Self {
        Self::new(
            access_token,
            refresh_token.or_else(|| self.refresh_token.clone()),
            self.user.clone(),
        )
    }

    /// Replace the user profile.
    pub fn with_user(&self, user: UserProfile) -> Self {
        Self {
            user,
            ..self.clone()
        }
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&RefreshToken> {
        self.refresh_token.as_ref()
    }

    /// Expiry read from the access token, if it carries one.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    /// Returns true when the access token's expiry is known and not after `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Convert to the persisted shape.
    pub fn to_stored(&self) -> StoredCredential {
        StoredCredential {
            access_token: self.access_token.as_str().to_string(),
            refresh_token: self.refresh_token.as_ref().map(|t| t.as_str().to_string()),
            user: Some(self.user.clone()),
        }
    }

    /// Restore from the persisted shape.
    ///
    /// Records without an access token or a user profile are not a usable
    /// session and yield `None`.
    pub fn from_stored(stored: StoredCredential) -> Option<Self> {
        if stored.access_token.is_empty() {
            return None;
        }
        let user = stored.user?;
        Some(Self::new(
            AccessToken::new(stored.access_token),
            stored
                .refresh_token
                .filter(|t| !t.is_empty())
                .map(RefreshToken::new),
            user,
        ))
    }
}

//! Identity service trait.

use async_trait::async_trait;

use crate::credentials::{LoginCredentials, SignupDetails, UserProfile};
use crate::models::{RefreshGrant, TokenGrant};
use crate::{AccessToken, RefreshToken, Result};

/// The identity service that issues and refreshes tokens.
///
/// Implementations translate wire failures into [`crate::Error`]: rejected
/// credentials become [`crate::error::CredentialError::Rejected`], other
/// non-success statuses become [`crate::error::ProtocolError`].
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Exchange email and password for a token pair.
    async fn login(&self, credentials: &LoginCredentials) -> Result<TokenGrant>;

    /// Create an account. Does not log in.
    async fn signup(&self, details: &SignupDetails) -> Result<()>;

    /// Fetch the profile the access token belongs to.
    async fn me(&self, token: &AccessToken) -> Result<UserProfile>;

    /// Exchange a refresh token for a new access token.
    async fn refresh(&self, token: &RefreshToken) -> Result<RefreshGrant>;
}

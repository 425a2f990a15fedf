//! Identity service over HTTP.

use async_trait::async_trait;
use tracing::{debug, instrument};

use quizgate_core::{
    AccessToken, CredentialError, Error, IdentityService, LoginCredentials, RefreshGrant,
    RefreshToken, Result, SignupDetails, TokenGrant, UserProfile,
};

use crate::client::{ApiClient, ApiRequest};
use crate::endpoints::{LOGIN, LoginRequest, ME, REFRESH, SIGNUP, SignupRequest, TokenResponse};

/// Statuses on login/signup that mean the input itself was refused.
const REJECTION_STATUSES: [u16; 5] = [400, 401, 403, 409, 422];

/// The `/auth` endpoints.
#[derive(Debug, Clone)]
pub struct HttpIdentity {
    client: ApiClient,
}

impl HttpIdentity {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityService for HttpIdentity {
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    async fn login(&self, credentials: &LoginCredentials) -> Result<TokenGrant> {
        let request = ApiRequest::post(LOGIN).json(&LoginRequest {
            email: credentials.email(),
            password: credentials.password(),
        })?;

        let response: TokenResponse = self
            .client
            .call(&request, None)
            .await
            .map_err(|e| rejected(e, "Invalid email or password"))?;
        debug!("Login accepted");
        response.into_token_grant()
    }

    #[instrument(skip(self, details), fields(email = %details.credentials().email()))]
    async fn signup(&self, details: &SignupDetails) -> Result<()> {
        let request = ApiRequest::post(SIGNUP).json(&SignupRequest {
            name: details.name(),
            email: details.credentials().email(),
            password: details.credentials().password(),
        })?;

        self.client
            .call_no_response(&request, None)
            .await
            .map_err(|e| rejected(e, "Signup failed"))
    }

    #[instrument(skip(self, token))]
    async fn me(&self, token: &AccessToken) -> Result<UserProfile> {
        self.client
            .call(&ApiRequest::get(ME), Some(token.as_str()))
            .await
    }

    #[instrument(skip(self, token))]
    async fn refresh(&self, token: &RefreshToken) -> Result<RefreshGrant> {
        let response: TokenResponse = self
            .client
            .call(&ApiRequest::post(REFRESH), Some(token.as_str()))
            .await?;
        response.into_refresh_grant()
    }
}

/// Turn a refusal of login/signup input into a [`CredentialError`].
fn rejected(err: Error, fallback: &str) -> Error {
    match err {
        Error::Protocol(e) if REJECTION_STATUSES.contains(&e.status) => {
            CredentialError::Rejected {
                status: e.status,
                detail: e.detail.unwrap_or_else(|| fallback.to_string()),
            }
            .into()
        }
        other => other,
    }
}

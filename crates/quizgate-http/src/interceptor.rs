//! Authenticated calls with refresh-and-retry on 401.

use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use quizgate_core::{AccessToken, AuthError, Error, ProtocolError, Result};
use quizgate_session::{AuthGateway, RefreshOutcome};

use crate::client::{ApiClient, ApiRequest, decode};

/// Sends requests with the current access token attached.
///
/// A 401 is handled once per request: the request joins the single-flight
/// refresh (or reuses a token another request already obtained) and is
/// resent exactly once with the new token. When the session cannot be
/// renewed the client is logged out and the call fails with
/// [`AuthError::SessionExpired`] carrying the original 401.
///
/// No Authorization header is sent while logged out.
#[derive(Debug, Clone)]
pub struct AuthorizedClient {
    client: ApiClient,
    gateway: AuthGateway,
}

impl AuthorizedClient {
    pub fn new(client: ApiClient, gateway: AuthGateway) -> Self {
        Self { client, gateway }
    }

    pub fn gateway(&self) -> &AuthGateway {
        &self.gateway
    }

    /// Send `request` and decode a JSON response body.
    pub async fn call<R: DeserializeOwned>(&self, request: &ApiRequest) -> Result<R> {
        let response = self.send(request).await?;
        decode(response).await
    }

    /// Send `request`, discarding any response body.
    pub async fn call_no_response(&self, request: &ApiRequest) -> Result<()> {
        self.send(request).await.map(drop)
    }

    /// Send `request`, refreshing and retrying once on a 401.
    #[instrument(skip(self, request), fields(method = %request.method(), path = %request.path()))]
    pub async fn send(&self, request: &ApiRequest) -> Result<Response> {
        let sent = self.gateway.context().store().access_token();
        match self.client.send(request, sent.as_ref().map(AccessToken::as_str)).await {
            Err(Error::Protocol(e)) if e.is_auth_error() => self.retry(request, sent, e).await,
            other => other,
        }
    }

    async fn retry(
        &self,
        request: &ApiRequest,
        sent: Option<AccessToken>,
        rejected: ProtocolError,
    ) -> Result<Response> {
        let store = self.gateway.context().store();

        // Another request may already have refreshed past the token we sent.
        let current = store.access_token().filter(|token| Some(token) != sent.as_ref());
        let token = match current {
            Some(token) => {
                debug!("Access token changed since the request was sent, retrying");
                Some(token)
            }
            None => match self.gateway.refresh_shared().await {
                RefreshOutcome::Refreshed(_) => store.access_token(),
                RefreshOutcome::LogoutRequired => None,
            },
        };

        let Some(token) = token else {
            info!("Session could not be renewed, logging out");
            self.gateway.logout();
            return Err(AuthError::SessionExpired(rejected).into());
        };

        let result = self.client.send(request, Some(token.as_str())).await;
        if matches!(&result, Err(Error::Protocol(e)) if e.is_auth_error()) {
            warn!("Request rejected again after refresh");
        }
        result
    }
}

//! Client wiring shared by the commands.

mod storage;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::debug;

use quizgate_core::{ApiUrl, Credential};
use quizgate_http::{ApiClient, AuthorizedClient, ClientConfig, HttpAssessment, HttpIdentity};
use quizgate_session::{AuthGateway, SessionConfig, SessionContext};

/// The auth gateway and authorized client of one CLI run, backed by the
/// stored login.
pub struct CliSession {
    gateway: AuthGateway,
    client: AuthorizedClient,
}

impl CliSession {
    /// Wire up the clients for `api_url`, restoring any stored login.
    pub fn open(api_url: &ApiUrl, data_dir: Option<&Path>) -> Result<Self> {
        let storage = storage::credential_storage(data_dir)?;
        debug!(path = %storage.path().display(), "Using credential file");

        let ctx = Arc::new(SessionContext::new(
            Arc::new(storage),
            SessionConfig::default(),
        ));
        let api = ApiClient::new(&ClientConfig::new(api_url.clone()))
            .context("Failed to create HTTP client")?;
        let gateway = AuthGateway::new(ctx, Arc::new(HttpIdentity::new(api.clone())));
        let client = AuthorizedClient::new(api, gateway.clone());

        Ok(Self { gateway, client })
    }

    pub fn gateway(&self) -> &AuthGateway {
        &self.gateway
    }

    /// Exam endpoints, authorized with the current login.
    pub fn assessment(&self) -> HttpAssessment {
        HttpAssessment::new(self.client.clone())
    }

    /// Resume the stored login, refreshing it if it has expired.
    pub async fn require_login(&self) -> Result<Credential> {
        if !self.gateway.is_authenticated() {
            bail!("Not logged in. Run 'quizgate login' first.");
        }
        self.gateway
            .resume()
            .await
            .context("Session expired, please log in again")
    }
}

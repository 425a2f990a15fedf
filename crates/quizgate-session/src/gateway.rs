//! Login, signup, refresh and logout against the identity service.

use std::sync::{Arc, Weak};

use chrono::Utc;
use futures_util::FutureExt;
use tracing::{debug, info, instrument, warn};

use quizgate_core::{
    AccessToken, AuthError, Credential, Error, IdentityService, LoginCredentials, Result,
    SignupDetails, UserProfile,
};

use crate::context::SessionContext;

/// Result of a refresh exchange.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// A new access token was stored.
    Refreshed(Credential),
    /// The session cannot be renewed; the caller must log out.
    LogoutRequired,
}

impl RefreshOutcome {
    pub fn is_refreshed(&self) -> bool {
        matches!(self, RefreshOutcome::Refreshed(_))
    }
}

/// The only writer of the token store.
///
/// Cheap to clone; clones share the same [`SessionContext`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use quizgate_core::{IdentityService, LoginCredentials};
/// use quizgate_session::{AuthGateway, SessionContext};
///
/// # async fn example(identity: Arc<dyn IdentityService>) -> quizgate_core::Result<()> {
/// let gateway = AuthGateway::new(Arc::new(SessionContext::in_memory()), identity);
/// let credential = gateway
///     .login(&LoginCredentials::new("ada@example.com", "hunter22"))
///     .await?;
/// println!("Logged in as {}", credential.user().name);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    ctx: Arc<SessionContext>,
    identity: Arc<dyn IdentityService>,
}

impl AuthGateway {
    pub fn new(ctx: Arc<SessionContext>, identity: Arc<dyn IdentityService>) -> Self {
        Self {
            inner: Arc::new(GatewayInner { ctx, identity }),
        }
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.inner.ctx
    }

    /// The held credential, if logged in.
    pub fn credential(&self) -> Option<Credential> {
        self.inner.ctx.store().current()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.inner.ctx.store().user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.ctx.store().is_authenticated()
    }

    /// Log in and fetch the user's profile.
    ///
    /// The token store is only written once both calls succeed; any failure
    /// leaves the previous state untouched.
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Credential> {
        credentials.validate()?;
        info!("Logging in");

        let grant = self.inner.identity.login(credentials).await?;
        let user = self.inner.identity.me(&grant.access_token).await?;
        let credential = Credential::new(grant.access_token, grant.refresh_token, user);

        self.inner.ctx.in_flight().clear();
        self.install(credential.clone());

        debug!(user = %credential.user().email, "Logged in");
        Ok(credential)
    }

    /// Create an account, then log in with the same email and password.
    #[instrument(skip(self, details), fields(email = %details.credentials().email()))]
    pub async fn signup(&self, details: &SignupDetails) -> Result<Credential> {
        details.validate()?;
        info!("Creating account");

        self.inner.identity.signup(details).await?;
        self.login(details.credentials()).await
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Never fails: every problem, including a missing refresh token, is
    /// reported as [`RefreshOutcome::LogoutRequired`]. This performs one
    /// exchange per call; concurrent callers should use
    /// [`refresh_shared`](Self::refresh_shared).
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> RefreshOutcome {
        let store = self.inner.ctx.store();
        let Some(current) = store.current() else {
            debug!("No credential held, nothing to refresh");
            return RefreshOutcome::LogoutRequired;
        };
        let Some(refresh_token) = current.refresh_token().cloned() else {
            debug!("No refresh token held");
            return RefreshOutcome::LogoutRequired;
        };

        info!("Refreshing access token");
        let grant = match self.inner.identity.refresh(&refresh_token).await {
            Ok(grant) => grant,
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                return RefreshOutcome::LogoutRequired;
            }
        };

        let next = current.with_access_token(grant.access_token, grant.refresh_token);
        if !store.replace_if_refresh_token(&refresh_token, next.clone()) {
            // Logged out or logged in again while the exchange was running.
            return match store.current() {
                Some(newer) => RefreshOutcome::Refreshed(newer),
                None => {
                    debug!("Credential cleared during refresh, discarding new token");
                    RefreshOutcome::LogoutRequired
                }
            };
        }

        self.arm(&next);
        debug!("Access token refreshed");
        RefreshOutcome::Refreshed(next)
    }

    /// Refresh, joining the exchange already in flight if there is one.
    ///
    /// The exchange runs on its own task, so it completes and updates the
    /// token store even if every waiting caller goes away.
    pub async fn refresh_shared(&self) -> RefreshOutcome {
        let in_flight = self.inner.ctx.in_flight();
        let shared = in_flight.join_or_start(|id| {
            let gateway = self.clone();
            let task = tokio::spawn(async move {
                let outcome = gateway.refresh().await;
                gateway.inner.ctx.in_flight().finish(id);
                outcome
            });
            async move {
                task.await.unwrap_or_else(|e| {
                    warn!(error = %e, "Refresh task did not complete");
                    RefreshOutcome::LogoutRequired
                })
            }
            .boxed()
        });
        shared.await
    }

    /// Forget the credential locally. No network call is made.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        let ctx = &self.inner.ctx;
        ctx.store().clear();
        ctx.scheduler().disarm();
        ctx.in_flight().clear();
        info!("Logged out");
    }

    /// Re-read the profile from the identity service and store it.
    ///
    /// A rejected access token is refreshed once; if that fails the client
    /// is logged out and [`AuthError::SessionExpired`] is returned.
    #[instrument(skip(self))]
    pub async fn fetch_user(&self) -> Result<UserProfile> {
        let token = self
            .inner
            .ctx
            .store()
            .access_token()
            .ok_or(AuthError::NotAuthenticated)?;

        let rejected = match self.inner.identity.me(&token).await {
            Ok(user) => return Ok(self.store_user(&token, user)),
            Err(Error::Protocol(e)) if e.is_auth_error() => e,
            Err(e) => return Err(e),
        };

        let token = match self.refresh_shared().await {
            RefreshOutcome::Refreshed(credential) => credential.access_token().clone(),
            RefreshOutcome::LogoutRequired => {
                self.logout();
                return Err(AuthError::SessionExpired(rejected).into());
            }
        };

        match self.inner.identity.me(&token).await {
            Ok(user) => Ok(self.store_user(&token, user)),
            Err(Error::Protocol(e)) if e.is_auth_error() => {
                self.logout();
                Err(AuthError::SessionExpired(e).into())
            }
            Err(e) => Err(e),
        }
    }

    /// Pick up a credential restored from storage.
    ///
    /// An expired access token is refreshed right away; otherwise the
    /// proactive timer is armed. Returns the usable credential, if any.
    #[instrument(skip(self))]
    pub async fn resume(&self) -> Option<Credential> {
        let credential = self.inner.ctx.store().current()?;
        if !credential.is_expired_at(Utc::now()) {
            self.arm(&credential);
            return Some(credential);
        }

        info!("Stored access token has expired, refreshing");
        match self.refresh_shared().await {
            RefreshOutcome::Refreshed(credential) => Some(credential),
            RefreshOutcome::LogoutRequired => {
                self.logout();
                None
            }
        }
    }

    fn store_user(&self, token: &AccessToken, user: UserProfile) -> UserProfile {
        match self.inner.ctx.store().update_user(token, user.clone()) {
            Some(credential) => credential.user().clone(),
            None => user,
        }
    }

    fn install(&self, credential: Credential) {
        self.inner.ctx.store().replace(credential.clone());
        self.arm(&credential);
    }

    fn arm(&self, credential: &Credential) {
        let gateway: Weak<GatewayInner> = Arc::downgrade(&self.inner);
        self.inner
            .ctx
            .scheduler()
            .arm(credential.access_token(), move || async move {
                if let Some(inner) = gateway.upgrade() {
                    AuthGateway { inner }.proactive_refresh().await;
                }
            });
    }

    async fn proactive_refresh(&self) {
        debug!("Proactive refresh due");
        if let RefreshOutcome::LogoutRequired = self.refresh_shared().await {
            warn!("Proactive refresh failed, logging out");
            self.logout();
        }
    }
}

impl std::fmt::Debug for AuthGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGateway")
            .field("context", &self.inner.ctx)
            .finish_non_exhaustive()
    }
}

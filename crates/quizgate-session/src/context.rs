//! Shared auth state for one client.

use std::sync::Arc;
use std::time::Duration;

use quizgate_core::{CredentialStorage, MemoryStorage};

use crate::in_flight::InFlightRefresh;
use crate::scheduler::{DEFAULT_SKEW_MARGIN, RefreshScheduler};
use crate::token_store::TokenStore;

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long before access-token expiry the proactive refresh fires.
    pub skew_margin: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            skew_margin: DEFAULT_SKEW_MARGIN,
        }
    }
}

/// Everything the auth gateway and the request interceptor share: the token
/// store, the refresh timer and the single-flight refresh slot.
///
/// Build one per client and hand it to both by `Arc`.
#[derive(Debug)]
pub struct SessionContext {
    store: TokenStore,
    scheduler: RefreshScheduler,
    in_flight: InFlightRefresh,
    config: SessionConfig,
}

impl SessionContext {
    /// Restore state from `storage`.
    pub fn new(storage: Arc<dyn CredentialStorage>, config: SessionConfig) -> Self {
        Self {
            store: TokenStore::restore(storage),
            scheduler: RefreshScheduler::new(config.skew_margin),
            in_flight: InFlightRefresh::new(),
            config,
        }
    }

    /// A context that persists nothing.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), SessionConfig::default())
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    pub fn in_flight(&self) -> &InFlightRefresh {
        &self.in_flight
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

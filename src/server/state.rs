use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::Duration;

use super::error::ApiError;
use crate::auth::{GoogleIdentityProvider, IdentityProvider};
use crate::config::Config;
use crate::store::SqliteStore;

pub struct State {
    pub config: Config,
    store: Mutex<SqliteStore>,
    identity: Option<Arc<dyn IdentityProvider>>,
    started_at: Instant,
}

impl State {
    /// Google sign-in is enabled only when both OAuth credentials are configured
    pub fn new(config: Config, store: SqliteStore) -> Arc<Self> {
        let identity = config.google_credentials().map(|(id, secret)| {
            Arc::new(GoogleIdentityProvider::new(id, secret)) as Arc<dyn IdentityProvider>
        });
        Self::with_identity_provider(config, store, identity)
    }

    pub fn with_identity_provider(
        config: Config,
        store: SqliteStore,
        identity: Option<Arc<dyn IdentityProvider>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            store: Mutex::new(store),
            identity,
            started_at: Instant::now(),
        })
    }

    /// Exclusive access to the store; never hold the guard across an `.await`
    pub fn store(&self) -> Result<MutexGuard<'_, SqliteStore>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::Internal("store lock poisoned".to_string()))
    }

    pub fn identity(&self) -> Option<&Arc<dyn IdentityProvider>> {
        self.identity.as_ref()
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    pub fn token_ttl(&self) -> Duration {
        self.config.token_ttl()
    }
}

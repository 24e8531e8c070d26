// ============================
// storefront-backend-lib/src/lib.rs
// ============================
//! Core functionality for the storefront auth backend.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthService, DefaultAuth, TokenService};
use crate::catalog::{Catalog, MemoryCatalog};
use crate::config::Settings;
use crate::middleware::AuthGate;
use crate::storage::{AccountStore, MemoryStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Registration and login
    pub auth: Arc<dyn AuthService>,
    /// Session token issuing and verification
    pub tokens: Arc<TokenService>,
    /// Store listing
    pub catalog: Arc<dyn Catalog>,
    /// Settings manager
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new application state
    pub fn new(
        store: Arc<dyn AccountStore>,
        catalog: Arc<dyn Catalog>,
        settings: Settings,
    ) -> anyhow::Result<Self> {
        let secret = settings.signing_secret()?;
        let tokens = Arc::new(TokenService::new(&secret));
        let auth = Arc::new(DefaultAuth::new(store, settings.hasher(), tokens.clone())?);

        Ok(Self {
            auth,
            tokens,
            catalog,
            settings: Arc::new(settings),
        })
    }

    /// Build in-memory backends from settings, loading the catalog seed if configured
    pub async fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let catalog = match &settings.catalog.seed_path {
            Some(path) => {
                let catalog = MemoryCatalog::from_json_file(path).await?;
                tracing::info!(stores = catalog.len(), path = %path.display(), "catalog seeded");
                catalog
            },
            None => MemoryCatalog::default(),
        };
        Self::new(Arc::new(MemoryStore::new()), Arc::new(catalog), settings)
    }

    /// Middleware state for protected routes
    pub fn auth_gate(&self) -> AuthGate {
        AuthGate::new(self.tokens.clone(), self.settings.auth.cookie_name.as_str())
    }
}

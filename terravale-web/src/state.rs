//! Application state shared by every request

use crate::{
    auth::{
        session::SessionIssuer,
        users::{UserService, UserStore},
    },
    WebResult,
};
use std::sync::Arc;
use terravale_core::TerravaleConfig;
use tracing::info;

#[cfg(feature = "sqlite")]
use crate::{auth::database::DatabaseUserStore, WebError};

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<TerravaleConfig>,
    /// Account registration, lookup and profile edits
    pub user_service: UserService,
    /// Login and logout
    pub sessions: SessionIssuer,
}

impl AppState {
    /// Create application state, connecting to the configured credential store.
    ///
    /// A configured database that cannot be reached is an error; the in-memory
    /// store is only used when no database URL is set.
    pub async fn new(config: TerravaleConfig) -> WebResult<Self> {
        let store = match config.database.url.as_deref() {
            #[cfg(feature = "sqlite")]
            Some(url) => {
                let db_store = DatabaseUserStore::connect(url).await.map_err(|e| {
                    WebError::Database(format!("Failed to open credential store: {}", e))
                })?;
                info!("Credential store: database");
                UserStore::database(db_store)
            }
            #[cfg(not(feature = "sqlite"))]
            Some(_) => {
                tracing::warn!("DATABASE_URL is set but the sqlite feature is disabled");
                UserStore::memory()
            }
            None => {
                info!("Credential store: in-memory (no DATABASE_URL)");
                UserStore::memory()
            }
        };

        Ok(Self::with_store(config, store))
    }

    /// Create application state on an existing user store
    pub fn with_store(config: TerravaleConfig, store: UserStore) -> Self {
        let user_service = UserService::new(store);
        let sessions = SessionIssuer::from_config(user_service.clone(), &config.session);

        Self {
            config: Arc::new(config),
            user_service,
            sessions,
        }
    }
}

//! Terravale Web Server
//!
//! Binds the listener and runs the Axum app until shutdown.

use crate::{create_app, AppState, WebError, WebResult};
use axum::serve;
use terravale_core::TerravaleConfig;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Main Terravale web server
pub struct TerravaleServer {
    config: TerravaleConfig,
    state: AppState,
}

impl TerravaleServer {
    /// Create a new server, opening the credential store
    pub async fn new(config: TerravaleConfig) -> WebResult<Self> {
        config.validate()?;
        let state = AppState::new(config.clone()).await?;

        Ok(Self { config, state })
    }

    /// Create a server on prepared application state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config.as_ref().clone(),
            state,
        }
    }

    /// Start the web server and serve until Ctrl-C
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();

        info!("Starting Terravale Web Server");
        info!("Server address: http://{}", address);
        info!("Development mode: {}", self.config.server.dev_mode);
        info!(
            "Credential store: {}",
            self.state.user_service.store().kind()
        );

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        if let Err(e) = serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
        {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        info!("Server stopped");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &TerravaleConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Builder for TerravaleServer
pub struct TerravaleServerBuilder {
    config: TerravaleConfig,
}

impl TerravaleServerBuilder {
    /// Create a new server builder with default configuration
    pub fn new() -> Self {
        Self {
            config: TerravaleConfig::default(),
        }
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.server.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Enable development mode
    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.config.server.dev_mode = dev_mode;
        self
    }

    /// Set database URL
    pub fn database_url<S: Into<String>>(mut self, database_url: S) -> Self {
        self.config.database.url = Some(database_url.into());
        self
    }

    /// Set the session signing secret
    pub fn jwt_secret<S: Into<String>>(mut self, secret: S) -> Self {
        self.config.session.jwt_secret = Some(secret.into());
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<TerravaleServer> {
        TerravaleServer::new(self.config).await
    }
}

impl Default for TerravaleServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

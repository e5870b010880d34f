//! Web server for docshelf.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::store::DocumentStore;
use crate::{DocshelfError, Result};

use super::handlers::AppState;
use super::router::{create_health_router, create_router, create_swagger_router};

/// Web server for the document API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Allowed CORS origins.
    cors_origins: Vec<String>,
    /// Multipart body budget in bytes.
    max_upload_size: usize,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &ServerConfig, store: Arc<DocumentStore>) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| DocshelfError::Config(format!("invalid server address: {e}")))?;

        Ok(Self {
            addr,
            app_state: Arc::new(AppState::new(store)),
            cors_origins: config.cors_origins.clone(),
            max_upload_size: (config.max_upload_size_mb as usize) * 1024 * 1024,
        })
    }

    /// Get the configured server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Build the complete router (API + health + swagger).
    fn build_router(&self) -> axum::Router {
        create_router(
            self.app_state.clone(),
            &self.cors_origins,
            self.max_upload_size,
        )
        .merge(create_health_router())
        .merge(create_swagger_router())
    }

    /// Run the web server until the process is stopped.
    pub async fn run(self) -> Result<()> {
        let router = self.build_router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, router).await?;
        Ok(())
    }
}

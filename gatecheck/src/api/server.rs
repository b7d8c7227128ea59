//! API server setup and shared application state.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::routes;
use crate::bulk::{LogMailer, Mailer};
use crate::config::AppConfig;
use crate::error::Result;
use crate::jobs::{InMemoryJobStore, JobEngine, JobStore, ProgressBroadcaster};
use crate::store::{AttendeeDirectory, InMemoryDirectory};
use ticket_render::{FontLibrary, FsAssetSource, TicketRenderer};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server bind address
    pub bind_address: String,
    /// Server port
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8750,
            enable_cors: true,
        }
    }
}

impl ApiServerConfig {
    /// Load API server config from environment variables, falling back to
    /// defaults.
    ///
    /// Supported env vars:
    /// - `API_BIND_ADDRESS` (e.g. "0.0.0.0")
    /// - `API_PORT` (e.g. "8080")
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(bind_address) = std::env::var("API_BIND_ADDRESS")
            && !bind_address.trim().is_empty()
        {
            config.bind_address = bind_address;
        }

        if let Ok(port) = std::env::var("API_PORT")
            && let Ok(parsed) = port.parse::<u16>()
        {
            config.port = parsed;
        }

        config
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server start time for uptime calculation
    pub start_time: Instant,
    /// Attendee directory (checkpoint store)
    pub directory: Arc<dyn AttendeeDirectory>,
    /// Job execution engine
    pub engine: JobEngine,
    /// Progress broadcaster for live job feeds
    pub broadcaster: Arc<ProgressBroadcaster>,
    /// Email delivery seam
    pub mailer: Arc<dyn Mailer>,
    /// Ticket rendering pipeline
    pub renderer: Arc<TicketRenderer>,
    /// Application configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Build state with the given collaborators; registry and broadcaster
    /// are wired here so the engine publishes into the same channels the
    /// API subscribes to.
    pub fn new(config: AppConfig, renderer: Arc<TicketRenderer>, mailer: Arc<dyn Mailer>) -> Self {
        let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let broadcaster = Arc::new(ProgressBroadcaster::new(store.clone()));
        let engine = JobEngine::new(store, broadcaster.clone());
        Self {
            start_time: Instant::now(),
            directory: Arc::new(InMemoryDirectory::new()),
            engine,
            broadcaster,
            mailer,
            renderer,
            config: Arc::new(config),
        }
    }

    /// In-memory state with a logging mailer and fontless renderer, for
    /// tests.
    pub fn for_tests() -> Self {
        let config = AppConfig::default();
        let renderer = Arc::new(TicketRenderer::new(
            FontLibrary::empty(),
            Arc::new(FsAssetSource::new(&config.data_dir)),
        ));
        Self::new(config, renderer, Arc::new(LogMailer))
    }
}

/// API server.
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
    cancel_token: CancellationToken,
}

impl ApiServer {
    /// Create with custom state.
    pub fn with_state(config: ApiServerConfig, state: AppState) -> Self {
        Self {
            config,
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Get the cancellation token for graceful shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Build the router with all middleware and routes.
    fn build_router(&self) -> Router {
        let mut router = routes::create_router(self.state.clone());

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router = router.layer(cors);
        }

        router.layer(TraceLayer::new_for_http())
    }

    /// Start the server.
    pub async fn run(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.bind_address, self.config.port)
            .parse()
            .map_err(|e| crate::Error::Other(format!("Invalid address: {}", e)))?;

        let router = self.build_router();
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("API server listening on http://{}", addr);

        let cancel_token = self.cancel_token.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                tracing::info!("API server shutting down...");
            })
            .await
            .map_err(|e| crate::Error::Other(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ApiServerConfig::default();
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.port, 8750);
        assert!(config.enable_cors);
    }

    #[test]
    fn test_app_state_creation() {
        let state = AppState::for_tests();
        assert!(state.start_time.elapsed().as_secs() < 1);
    }

    #[test]
    fn test_server_creation() {
        let server = ApiServer::with_state(ApiServerConfig::default(), AppState::for_tests());

        // Server should have a valid cancel token
        let token = server.cancel_token();
        assert!(!token.is_cancelled());
    }
}

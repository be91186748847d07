//! Gate server startup and shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use super::auth::AuthGate;
use super::registry::SubscriberRegistry;
use super::router::{AppState, create_router};
use super::state::GateState;
use crate::config::{API_KEY_ENV, Config, DEFAULT_API_KEY, Variant};
use crate::{Error, Result};

/// Gate demo server
pub struct Gateway {
    /// Configuration
    config: Config,
}

impl Gateway {
    /// Create a new gateway from resolved configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the server until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the host does not parse or the listener cannot
    /// bind.
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let api_key = self.config.auth.resolve_api_key();
        if api_key == DEFAULT_API_KEY {
            warn!(
                "Using the built-in demo API key - set {API_KEY_ENV} before exposing this server"
            );
        }

        let registry = SubscriberRegistry::new();
        let state = Arc::new(AppState {
            variant: self.config.server.variant,
            gate: GateState::new(),
            registry: registry.clone(),
            auth: Arc::new(AuthGate::new(api_key)),
            keep_alive_interval: self.config.streaming.keep_alive_interval,
        });

        let app = create_router(state, &self.config.server.static_dir);

        let listener = TcpListener::bind(addr).await?;

        info!("============================================================");
        info!("GATE SERVER v{}", env!("CARGO_PKG_VERSION"));
        info!("============================================================");
        info!(
            host = %self.config.server.host,
            port = self.config.server.port,
            variant = %self.config.server.variant,
            "Listening"
        );
        info!("  POST /api/gate/open    (X-API-Key)");
        info!("  POST /api/gate/close   (X-API-Key)");
        match self.config.server.variant {
            Variant::Broadcast => info!("  GET  /api/gate/events  (SSE stream)"),
            Variant::Poll => info!("  GET  /api/gate/status  (poll)"),
        }
        info!("============================================================");

        // Run server with graceful shutdown; the signal handler cancels the
        // registry so long-lived event streams close and the drain completes.
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(registry))
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal(registry: SubscriberRegistry) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
    registry.shutdown();
}

//! Axum-based HTTP gateway server.
//!
//! [`GatewayServer`] wires the address resolver, transport and handlers into
//! a running axum service.
//!
//! # Endpoints
//!
//! Every route is served both bare and under `/api`.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Liveness check, always `200 OK`. |
//! | `POST` | `/proxy` | Relay a described call to an upstream service. |

use crate::backend::{HttpTransport, Transport};
use crate::error::GatewayResult;
use crate::handlers;
use crate::state::AppState;
use arrgate_kernel::config::GatewaySettings;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

// ─────────────────────────────────────────────────────────────────────────────
// GatewayServer
// ─────────────────────────────────────────────────────────────────────────────

/// High-level gateway server built from immutable [`GatewaySettings`].
pub struct GatewayServer {
    settings: GatewaySettings,
    transport: Arc<dyn Transport>,
}

impl GatewayServer {
    /// Create a server that dials upstreams with [`HttpTransport`].
    pub fn new(settings: GatewaySettings) -> GatewayResult<Self> {
        let transport = HttpTransport::new()?;
        Ok(Self::with_transport(settings, Arc::new(transport)))
    }

    /// Create a server with a caller-supplied transport.
    pub fn with_transport(settings: GatewaySettings, transport: Arc<dyn Transport>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Build the axum [`Router`]. Call [`start()`](Self::start) to bind and
    /// serve.
    pub fn build_app(&self) -> Router {
        let state = AppState::new(
            self.settings.address_resolver(),
            Arc::clone(&self.transport),
            self.settings.request_timeout(),
        );

        Router::new()
            .merge(api_routes())
            .nest("/api", api_routes())
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind to the configured address and serve until Ctrl-C or SIGTERM.
    pub async fn start(self) -> std::io::Result<()> {
        let app = self.build_app();
        let addr = self.settings.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!(
            addr = %addr,
            mode = ?self.settings.network_mode(),
            bridge_host = %self.settings.bridge_host,
            timeout_ms = self.settings.request_timeout_ms,
            "arrgate gateway listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/proxy", post(handlers::proxy))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

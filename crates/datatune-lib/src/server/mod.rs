//! HTTP server.
//!
//! Wraps the search aggregator and connect flow in the JSON API the web
//! front end talks to, behind cookie sessions.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod session;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::connect::ConnectService;
use crate::errors::{DataTuneError, Result};
use crate::search::SearchAggregator;
use config::{ServerConfig, OAUTH_CALLBACK_PATH, SHUTDOWN_TIMEOUT_SECS};
use session::SessionStore;

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Shared state for axum handlers.
pub struct AppState {
    pub aggregator: Arc<SearchAggregator>,
    pub connect: Arc<ConnectService>,
    pub sessions: SessionStore,
    pub public_url: Option<String>,
}

impl AppState {
    pub fn new(
        aggregator: Arc<SearchAggregator>,
        connect: Arc<ConnectService>,
        sessions: SessionStore,
        public_url: Option<String>,
    ) -> Self {
        Self {
            aggregator,
            connect,
            sessions,
            public_url,
        }
    }
}

// ---------------------------------------------------------------------------
// ShutdownHandle
// ---------------------------------------------------------------------------

/// Handle returned by `start_server` that allows triggering graceful shutdown.
pub struct ShutdownHandle {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ShutdownHandle {
    /// Address the listener actually bound, useful with port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signal the server to stop and wait for in-flight requests, at most
    /// `SHUTDOWN_TIMEOUT_SECS`.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            tx.send(()).map_err(|_| DataTuneError::Server {
                status: 500,
                message: "Server already stopped".into(),
            })?;
        }
        let timeout = std::time::Duration::from_secs(SHUTDOWN_TIMEOUT_SECS);
        match tokio::time::timeout(timeout, &mut self.task).await {
            Ok(_) => Ok(()),
            Err(_) => {
                tracing::warn!("Graceful shutdown timed out after {}s, aborting", SHUTDOWN_TIMEOUT_SECS);
                self.task.abort();
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Router construction
// ---------------------------------------------------------------------------

/// Build the router. Public routes are mounted directly; the rest sit
/// behind the session middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::home))
        .route("/auth/callback", post(handlers::auth_callback))
        .route("/logout", get(handlers::logout));

    let protected_routes = Router::new()
        .route("/api/user", get(handlers::get_user))
        .route("/api/search-files", post(handlers::search_files))
        .route("/api/connect-service", post(handlers::connect_service))
        .route("/api/connected-services", get(handlers::connected_services))
        .route(OAUTH_CALLBACK_PATH, get(handlers::oauth_callback))
        .route_layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::require_session,
        ));

    public_routes
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// ---------------------------------------------------------------------------
// Server startup
// ---------------------------------------------------------------------------

/// Bind and start serving in a background task.
pub async fn start_server(config: ServerConfig, state: Arc<AppState>) -> Result<ShutdownHandle> {
    config.validate()?;

    let router = build_router(state);
    let addr = config.addr();

    let listener = TcpListener::bind(&addr).await.map_err(|e| DataTuneError::Server {
        status: 500,
        message: format!("Failed to bind to {}: {}", addr, e),
    })?;

    let local_addr = listener.local_addr().map_err(|e| DataTuneError::Server {
        status: 500,
        message: format!("Failed to get local address: {}", e),
    })?;

    tracing::info!(addr = %local_addr, "HTTP server starting");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
            tracing::info!("Shutdown signal received, draining in-flight requests");
        });
        if let Err(e) = serve.await {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(ShutdownHandle {
        local_addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

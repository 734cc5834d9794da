//! HTTP server

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use velero_rest_backup::ClientProvider;
use velero_rest_common::retry::RetryConfig;
use velero_rest_common::{DEFAULT_LISTEN_PORT, DEFAULT_VELERO_NAMESPACE};

use crate::auth::require_token;
use crate::error::{ApiError, ServerError};
use crate::handlers::{backup, restore};

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address to bind the server
    pub addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_LISTEN_PORT)),
        }
    }
}

/// Settings resolved once at startup and shared by every request
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Namespace Velero runs in; every Velero object is read and written here
    pub velero_namespace: String,
    /// Bearer token required on `/k8s/*` routes, if any
    pub auth_token: Option<String>,
    /// Retry policy for Pod annotation conflicts
    pub retry: RetryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            velero_namespace: DEFAULT_VELERO_NAMESPACE.to_string(),
            auth_token: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Shared state for handlers
#[derive(Clone)]
pub struct AppState {
    /// Immutable configuration
    pub config: Arc<AppConfig>,
    /// Source of cluster clients
    pub clients: Arc<dyn ClientProvider>,
}

impl AppState {
    /// Create state from config and a client provider
    pub fn new(config: AppConfig, clients: Arc<dyn ClientProvider>) -> Self {
        Self {
            config: Arc::new(config),
            clients,
        }
    }
}

fn handle_panic(_err: Box<dyn Any + Send + 'static>) -> Response {
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
}

/// Create the router
///
/// Routes:
/// - `GET /k8s/backup/` - list backups
/// - `GET|POST|DELETE /k8s/backup/{name}` - get, create or delete a backup
/// - `GET|POST /k8s/restore/{name}` - get a restore, or restore from backup `name`
/// - `GET /healthz` - liveness
pub fn build_router(state: AppState) -> Router {
    let k8s = Router::new()
        .route("/k8s/backup", get(backup::list_backups))
        .route("/k8s/backup/", get(backup::list_backups))
        .route(
            "/k8s/backup/{name}",
            get(backup::get_backup)
                .post(backup::create_backup)
                .delete(backup::delete_backup),
        )
        .route(
            "/k8s/restore/{name}",
            get(restore::get_restore).post(restore::create_restore),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .merge(k8s)
        .route("/healthz", get(|| async { "ok" }))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C
pub async fn start_server(config: ServerConfig, state: AppState) -> Result<(), ServerError> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.addr,
            source,
        })?;

    info!(addr = %config.addr, "Starting velero-rest server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Cannot listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert_eq!(ServerConfig::default().addr.to_string(), "0.0.0.0:2020");

        let config = AppConfig::default();
        assert_eq!(config.velero_namespace, "velero");
        assert!(config.auth_token.is_none());
    }
}

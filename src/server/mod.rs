//! HTTP and WebSocket front end.
//!
//! # Endpoints
//!
//! - `GET /` - index of configured log files, or the viewer page with `?file=`
//! - `GET /ws?file=<path>` - live stream: join snapshot, then appended lines
//! - `GET /api/loadmore?file=&offset=&limit=` - JSON line window
//!
//! Every route sits behind optional HTTP Basic authentication.

mod auth;
mod error;
mod handlers;
mod pages;
mod ws;


use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::get;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::service::LogService;

pub use error::ServerError;

/// Shared state for handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LogService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let service = LogService::new(config.stream.settings());
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
        }
    }
}

/// Build the axum router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/ws", get(ws::websocket))
        .route("/api/loadmore", get(handlers::load_more))
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_auth))
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)
}

/// Bind to the configured port and serve until `shutdown` resolves.
pub async fn run<F>(config: Config, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| ServerError::Bind {
            address: address.clone(),
            source: e,
        })?;

    if config.auth.enabled {
        tracing::info!(username = %config.auth.username, "authentication enabled");
    } else {
        tracing::info!("authentication disabled");
    }
    tracing::info!(address = %address, log_files = config.log_files.len(), "loged server listening");

    let result = serve(listener, AppState::new(config), shutdown).await;
    tracing::info!("loged server stopped");
    result
}

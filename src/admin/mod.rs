//! Read-only status API.

pub mod handlers;

use std::sync::Arc;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::orchestrator::FailoverOrchestrator;
use self::handlers::*;

pub fn setup_admin_router(orchestrator: Arc<FailoverOrchestrator>) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/endpoints", get(get_endpoints))
        .route("/endpoints/{id}", get(get_endpoint))
        .layer(TraceLayer::new_for_http())
        .with_state(orchestrator)
}

/// Serve the status API until `shutdown` completes.
pub async fn serve<F>(
    listener: tokio::net::TcpListener,
    orchestrator: Arc<FailoverOrchestrator>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Status API listening");
    axum::serve(listener, setup_admin_router(orchestrator))
        .with_graceful_shutdown(shutdown)
        .await
}

//! HTTP surface of the feed.
//!
//! # Routes
//!
//! ```text
//! PUT  /api/package                     multipart upload, field "package"
//! GET  /packages?q=<query>              search
//! GET  /package/:id                     versions, newest first
//! GET  /package/:id/:version/content    archive download
//! GET  /session/packages                packages touched by this process
//! ```

mod handlers;
mod session;

use std::future;
use std::io;
use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, put};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub use handlers::AppState;

/// Largest accepted upload body (256 MiB).
pub const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Build the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/package", put(handlers::push))
        .route("/packages", get(handlers::search))
        .route("/package/:id", get(handlers::package_versions))
        .route("/package/:id/:version/content", get(handlers::package_content))
        .route("/session/packages", get(handlers::session_packages))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Serve until Ctrl+C.
pub async fn serve(addr: SocketAddr, state: AppState) -> io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Feed server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Feed server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Cannot listen for Ctrl+C; serving until killed");
            future::pending::<()>().await;
        }
    }
}

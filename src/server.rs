//! Static file server over the relocated artifact tree.
//!
//! Routes:
//!   GET /               - the dashboard document
//!   GET /health         - liveness probe, plain `OK`
//!   GET /static/<name>  - any file in the static directory
//!   GET /<name>         - same, at the root

use std::path::Path;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::ServerConfig;
use crate::logging;

async fn health() -> &'static str {
    "OK"
}

pub fn router(static_dir: &Path, index_document: &str) -> Router {
    Router::new()
        .route("/health", get(health))
        .route_service("/", ServeFile::new(static_dir.join(index_document)))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback_service(ServeDir::new(static_dir))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        logging::log(
            logging::Level::Info,
            logging::Domain::Server,
            "shutdown",
            logging::obj(&[("msg", logging::v_str("shutdown signal received"))]),
        );
    }
}

/// Bind `HOST:PORT` and serve until Ctrl-C.
pub async fn serve(cfg: &ServerConfig) -> Result<()> {
    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    logging::log_server_listening(&addr, &cfg.static_dir);

    axum::serve(listener, router(&cfg.static_dir, &cfg.index_document))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

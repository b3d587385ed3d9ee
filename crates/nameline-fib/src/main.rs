//! Standalone compute endpoint.
//!
//! Serves the Fibonacci computation and the registration bridge over HTTP.
//! The process keeps no resolver state of its own; registrations received
//! on the bridge are forwarded straight to the registry named in the body.
//!
//! Environment:
//!
//! - `NAMELINE_FIB_LISTEN` - HTTP listen address (default `0.0.0.0:9090`)
//! - `NAMELINE_LOG_LEVEL`  - trace, debug, info, warn or error (default `info`)

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, Level};

const DEFAULT_LISTEN: &str = "0.0.0.0:9090";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let level = match std::env::var("NAMELINE_LOG_LEVEL") {
        Ok(value) => value.parse::<Level>().with_context(|| {
            format!("NAMELINE_LOG_LEVEL must be trace, debug, info, warn or error, got '{value}'")
        })?,
        Err(_) => Level::INFO,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let listen: SocketAddr = std::env::var("NAMELINE_FIB_LISTEN")
        .unwrap_or_else(|_| DEFAULT_LISTEN.to_string())
        .parse()
        .context("NAMELINE_FIB_LISTEN must be a socket address like 0.0.0.0:9090")?;

    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {listen}"))?;
    info!("Compute endpoint listening on http://{listen}");

    axum::serve(listener, nameline_fib::router())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated")?;

    info!("Compute endpoint stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Failed to listen for shutdown signal");
    }
}

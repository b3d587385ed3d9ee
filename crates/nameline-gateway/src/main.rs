//! Front-end gateway daemon.
//!
//! Exposes the resolution chain over HTTP. The process holds no resolver
//! state; every request queries the registry named in its parameters.
//!
//! Environment:
//!
//! - `NAMELINE_GATEWAY_LISTEN`     - HTTP listen address (default `0.0.0.0:8080`)
//! - `NAMELINE_QUERY_TIMEOUT_SECS` - registry query timeout (default 5)
//! - `NAMELINE_CALL_TIMEOUT_SECS`  - compute call timeout (default 5)
//! - `NAMELINE_LOG_LEVEL`          - trace, debug, info, warn or error (default `info`)

use std::net::SocketAddr;

use anyhow::Context;
use nameline_core::{ClientConfig, ResolverClient};
use nameline_gateway::AppState;
use tokio::net::TcpListener;
use tracing::{info, Level};

const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let level = match std::env::var("NAMELINE_LOG_LEVEL") {
        Ok(value) => value.parse::<Level>().with_context(|| {
            format!("NAMELINE_LOG_LEVEL must be trace, debug, info, warn or error, got '{value}'")
        })?,
        Err(_) => Level::INFO,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let listen: SocketAddr = std::env::var("NAMELINE_GATEWAY_LISTEN")
        .unwrap_or_else(|_| DEFAULT_LISTEN.to_string())
        .parse()
        .context("NAMELINE_GATEWAY_LISTEN must be a socket address like 0.0.0.0:8080")?;

    let config = client_config_from_env()?;
    info!(
        "Resolution timeouts: query {}s, call {}s",
        config.query_timeout_secs, config.call_timeout_secs
    );

    let state = AppState {
        client: ResolverClient::with_config(&config),
    };

    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {listen}"))?;
    info!("Gateway listening on http://{listen}");

    axum::serve(listener, nameline_gateway::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated")?;

    info!("Gateway stopped");
    Ok(())
}

fn client_config_from_env() -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::default();

    if let Ok(value) = std::env::var("NAMELINE_QUERY_TIMEOUT_SECS") {
        config.query_timeout_secs = value.parse().with_context(|| {
            format!("NAMELINE_QUERY_TIMEOUT_SECS must be a number of seconds, got '{value}'")
        })?;
    }
    if let Ok(value) = std::env::var("NAMELINE_CALL_TIMEOUT_SECS") {
        config.call_timeout_secs = value.parse().with_context(|| {
            format!("NAMELINE_CALL_TIMEOUT_SECS must be a number of seconds, got '{value}'")
        })?;
    }

    config.validate().context("Invalid timeout configuration")?;
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Failed to listen for shutdown signal");
    }
}

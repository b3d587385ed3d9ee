// # namelined - Authoritative Resolver Daemon
//
// The namelined daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime
// 3. Running the UDP resolver loop over a shared record store
// 4. Serving the HTTP registration gateway on the same store
//
// All resolution and protocol logic lives in nameline-core; this is a
// thin integration layer.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `NAMELINE_UDP_LISTEN`: UDP listen address (default 0.0.0.0:53533)
// - `NAMELINE_HTTP_LISTEN`: HTTP listen address (default 0.0.0.0:8080)
// - `NAMELINE_EVENT_CAPACITY`: Event channel capacity (default 1000)
// - `NAMELINE_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export NAMELINE_UDP_LISTEN=0.0.0.0:53533
// export NAMELINE_HTTP_LISTEN=0.0.0.0:8080
// export NAMELINE_LOG_LEVEL=debug
//
// namelined
// ```

mod app;

use anyhow::{anyhow, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use nameline_core::{Authority, AuthorityConfig, AuthorityEvent, RecordStore};

const DEFAULT_UDP_LISTEN: &str = "0.0.0.0:53533";
const DEFAULT_HTTP_LISTEN: &str = "0.0.0.0:8080";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    udp_listen: SocketAddr,
    http_listen: SocketAddr,
    event_channel_capacity: usize,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            udp_listen: parse_addr_env("NAMELINE_UDP_LISTEN", DEFAULT_UDP_LISTEN)?,
            http_listen: parse_addr_env("NAMELINE_HTTP_LISTEN", DEFAULT_HTTP_LISTEN)?,
            event_channel_capacity: match env::var("NAMELINE_EVENT_CAPACITY") {
                Ok(raw) => raw.parse().map_err(|_| {
                    anyhow!(
                        "NAMELINE_EVENT_CAPACITY must be a positive integer. Got: {}",
                        raw
                    )
                })?,
                Err(_) => 1000,
            },
            log_level: env::var("NAMELINE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.event_channel_capacity == 0 {
            anyhow::bail!("NAMELINE_EVENT_CAPACITY must be at least 1");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "NAMELINE_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

/// Read a socket address from the environment, falling back to a default
fn parse_addr_env(name: &str, default: &str) -> Result<SocketAddr> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|_| {
        anyhow!(
            "{} must be a socket address like {}. Got: {}",
            name,
            default,
            raw
        )
    })
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    info!("Starting namelined daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            DaemonExitCode::RuntimeError
        } else {
            DaemonExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let store = RecordStore::new();

    // Bind the resolver first: a taken UDP port is fatal, not retryable.
    let authority_config = AuthorityConfig {
        listen: config.udp_listen,
        event_channel_capacity: config.event_channel_capacity,
    };
    let (authority, events) = Authority::bind(&authority_config, store.clone())
        .await
        .with_context(|| format!("failed to bind resolver socket on {}", config.udp_listen))?;
    info!(
        "Authoritative resolver bound on udp://{}",
        authority.local_addr()?
    );

    tokio::spawn(drain_events(events));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let authority_task =
        tokio::spawn(async move { authority.run_with_shutdown(Some(shutdown_rx)).await });

    // Registration gateway shares the resolver's store.
    let router = app::router(app::AppState { store });
    let listener = tokio::net::TcpListener::bind(config.http_listen)
        .await
        .with_context(|| format!("failed to bind gateway socket on {}", config.http_listen))?;
    info!(
        "Registration gateway listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("registration gateway failed")?;

    // The gateway saw the signal; bring the resolver loop down too.
    let _ = shutdown_tx.send(());
    authority_task.await??;

    info!("Daemon stopped cleanly");
    Ok(())
}

/// Log resolver events at debug level so the channel never fills up
async fn drain_events(mut events: mpsc::Receiver<AuthorityEvent>) {
    while let Some(event) = events.recv().await {
        debug!("Authority event: {:?}", event);
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to setup SIGTERM handler: {}", e);
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to setup SIGINT handler: {}", e);
            return;
        }
    };

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    info!("Received shutdown signal: {}", name);
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for CTRL-C: {}", e);
        return;
    }
    info!("Received shutdown signal: SIGINT");
}

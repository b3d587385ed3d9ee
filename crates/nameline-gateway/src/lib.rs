//! Front-end resolution gateway.
//!
//! One public endpoint drives the whole chain: resolve a hostname through
//! the registry, call the compute endpoint at the resolved address, relay
//! the answer. Every failure along the chain maps onto a caller-visible
//! status:
//!
//! | Failure                          | Status    |
//! |----------------------------------|-----------|
//! | missing or unparsable parameter  | 400       |
//! | registry query timed out         | 504       |
//! | compute call timed out           | 504       |
//! | hostname not registered          | 502       |
//! | undecodable registry reply       | 502       |
//! | socket or connection failure     | 502       |
//! | compute endpoint error status    | passed on |

use std::net::{IpAddr, SocketAddr};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::warn;

use nameline_core::{ComputeResponse, Error, ResolverClient};

/// Shared state for the gateway handlers
#[derive(Clone)]
pub struct AppState {
    /// Resolution client carrying the configured timeouts
    pub client: ResolverClient,
}

/// Build the gateway router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/fibonacci", get(resolve_chain))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Raw query parameters.
///
/// Everything arrives as optional text and is validated by hand so each
/// bad input earns a specific 400 instead of a generic extractor
/// rejection.
#[derive(Debug, Deserialize)]
struct ChainParams {
    hostname: Option<String>,
    registry_addr: Option<String>,
    registry_port: Option<String>,
    compute_port: Option<String>,
    number: Option<String>,
}

/// A fully validated chain request
#[derive(Debug, PartialEq, Eq)]
struct ChainRequest {
    hostname: String,
    registry: SocketAddr,
    compute_port: u16,
    number: u64,
}

impl ChainParams {
    /// All five parameters are required; nothing is looked up or sent
    /// until every one of them parses.
    fn validate(self) -> Result<ChainRequest, ApiError> {
        let hostname = require(self.hostname, "hostname")?;
        let registry_addr = require(self.registry_addr, "registry_addr")?;
        let registry_port = parse_port(&require(self.registry_port, "registry_port")?, "registry_port")?;
        let compute_port = parse_port(&require(self.compute_port, "compute_port")?, "compute_port")?;
        let raw_number = require(self.number, "number")?;

        let ip: IpAddr = registry_addr.parse().map_err(|_| {
            ApiError::BadRequest(format!(
                "registry_addr {registry_addr:?} is not an IP address"
            ))
        })?;
        let number: u64 = raw_number.parse().map_err(|_| {
            ApiError::BadRequest(format!(
                "number must be a non-negative integer, got {raw_number:?}"
            ))
        })?;

        Ok(ChainRequest {
            hostname,
            registry: SocketAddr::new(ip, registry_port),
            compute_port,
            number,
        })
    }
}

fn require(value: Option<String>, name: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ApiError::BadRequest(format!(
            "missing query parameter {name}"
        ))),
    }
}

fn parse_port(value: &str, name: &str) -> Result<u16, ApiError> {
    match value.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ApiError::BadRequest(format!(
            "{name} must be a non-zero port, got {value:?}"
        ))),
    }
}

/// Error body returned by every failing handler
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Handler failures mapped onto HTTP statuses
#[derive(Debug, PartialEq, Eq)]
enum ApiError {
    /// 400: the caller sent something unusable
    BadRequest(String),
    /// 502: the chain broke between gateway, registry, and endpoint
    BadGateway(String),
    /// 504: a timeout expired along the chain
    GatewayTimeout(String),
    /// The compute endpoint answered with an error status; relay it as-is
    Downstream(u16),
}

impl ApiError {
    /// Map a resolution chain failure onto the caller-visible status.
    fn from_resolution(error: Error) -> Self {
        match error {
            Error::Validation(message) => ApiError::BadRequest(message),
            Error::QueryTimeout => {
                ApiError::GatewayTimeout("registry query timed out".to_string())
            }
            Error::DownstreamTimeout => {
                ApiError::GatewayTimeout("compute call timed out".to_string())
            }
            Error::DownstreamStatus(status) => ApiError::Downstream(status),
            other => ApiError::BadGateway(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::BadGateway(message) => (StatusCode::BAD_GATEWAY, message),
            ApiError::GatewayTimeout(message) => (StatusCode::GATEWAY_TIMEOUT, message),
            ApiError::Downstream(code) => (
                StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY),
                format!("compute endpoint answered with status {code}"),
            ),
        };
        warn!("Request failed with {}: {}", status, message);
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// `GET /fibonacci?hostname=..&registry_addr=..&registry_port=..&compute_port=..&number=..`
async fn resolve_chain(
    State(state): State<AppState>,
    Query(params): Query<ChainParams>,
) -> Result<Json<ComputeResponse>, ApiError> {
    let request = params.validate()?;

    let fibonacci = state
        .client
        .resolve_and_call(
            &request.hostname,
            request.registry,
            request.compute_port,
            request.number,
        )
        .await
        .map_err(ApiError::from_resolution)?;

    Ok(Json(ComputeResponse { fibonacci }))
}

/// Liveness probe
async fn healthz() -> &'static str {
    "OK"
}

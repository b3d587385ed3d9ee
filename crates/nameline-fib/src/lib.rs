// # nameline-fib
//
// The compute endpoint of the nameline system: serves Fibonacci numbers
// over HTTP and forwards its own hostname registration to the registry.
//
// ## Endpoints
//
// - `GET /fibonacci?number=<n>` → `{"fibonacci": F(n)}`
// - `PUT /register` → validates and forwards a registration datagram
// - `GET /healthz` → liveness probe
//
// The service holds no record store of its own; registration is pure
// forwarding through the wire protocol. Arithmetic is 128-bit and
// checked, so the largest accepted input is 186.

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use nameline_core::{send_registration, ComputeResponse, RegisterRequest};

/// Largest input whose Fibonacci number fits in a u128
pub const MAX_INPUT: u64 = 186;

/// Compute F(n) iteratively with checked 128-bit arithmetic.
///
/// Returns `None` when the value would overflow a `u128`, which happens
/// for every `n > 186`.
pub fn fibonacci(n: u64) -> Option<u128> {
    if n == 0 {
        return Some(0);
    }
    let (mut a, mut b) = (0u128, 1u128);
    for _ in 1..n {
        let next = a.checked_add(b)?;
        a = b;
        b = next;
    }
    Some(b)
}

/// Build the compute service router
pub fn router() -> Router {
    Router::new()
        .route("/fibonacci", get(compute))
        .route("/register", put(register))
        .route("/healthz", get(healthz))
}

#[derive(Debug, Deserialize)]
struct ComputeParams {
    number: Option<String>,
}

#[derive(Debug, Serialize)]
struct RegisterResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Service error responses
#[derive(Debug)]
enum ApiError {
    /// Missing or unparsable input
    BadRequest(String),
    /// The registration datagram could not be sent
    BadGateway(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::BadGateway(message) => (StatusCode::BAD_GATEWAY, message),
        };
        warn!("Request rejected: {}", message);
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

async fn compute(
    Query(params): Query<ComputeParams>,
) -> Result<Json<ComputeResponse>, ApiError> {
    let raw = params
        .number
        .ok_or_else(|| ApiError::BadRequest("missing query parameter number".to_string()))?;
    let number: u64 = raw.trim().parse().map_err(|_| {
        ApiError::BadRequest(format!("number {raw:?} is not a non-negative integer"))
    })?;
    let value = fibonacci(number).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "number {number} overflows 128-bit arithmetic (max {MAX_INPUT})"
        ))
    })?;

    debug!("Computed F({}) = {}", number, value);
    Ok(Json(ComputeResponse { fibonacci: value }))
}

async fn register(
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let registration = request
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    send_registration(
        &registration.hostname,
        &registration.address,
        registration.registry,
    )
    .await
    .map_err(|e| ApiError::BadGateway(format!("failed to forward registration: {e}")))?;

    info!(
        "Forwarded registration {} -> {} to {}",
        registration.hostname, registration.address, registration.registry
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful".to_string(),
        }),
    ))
}

async fn healthz() -> &'static str {
    "OK"
}

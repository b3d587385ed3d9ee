//! HTTP registration gateway
//!
//! Co-located with the resolver loop inside namelined. A registration is
//! written to the shared record store directly, then the wire datagram is
//! forwarded to the registry endpoint named in the request, fire-and-forget.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{info, warn};

use nameline_core::{send_registration, RecordStore, RegisterRequest};

/// Shared state for the gateway handlers
#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
}

/// Build the gateway router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/healthz", get(healthz))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct RegisterResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Gateway error responses
#[derive(Debug)]
enum ApiError {
    /// Incomplete or malformed registration input
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
        warn!("Registration rejected: {}", message);
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let registration = request
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    // Direct write first; the forwarded datagram makes the resolver loop
    // apply the same upsert, which is idempotent.
    state
        .store
        .put(&registration.hostname, &registration.address)
        .await;

    send_registration(
        &registration.hostname,
        &registration.address,
        registration.registry,
    )
    .await
    .map_err(|e| ApiError::BadGateway(format!("failed to forward registration: {e}")))?;

    info!(
        "Registered {} -> {} (forwarded to {})",
        registration.hostname, registration.address, registration.registry
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: format!(
                "Hostname {} registered successfully",
                registration.hostname
            ),
        }),
    ))
}

async fn healthz() -> &'static str {
    "OK"
}

//! Contract Test: Resolution Chain
//!
//! Runs the full chain against real components: an authoritative registry
//! on an ephemeral UDP port and the actual compute service router served
//! over HTTP.
//!
//! Constraints verified:
//! - A registered hostname resolves and the compute answer comes back 200.
//! - An unregistered hostname surfaces as 502, not a hang or a 500.
//! - A compute-side client error passes through with its original status.
//! - Parameter validation rejects incomplete requests with 400 before any
//!   network I/O.
//! - A silent registry turns into 504 within the configured query timeout.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use nameline_core::{
    send_registration, Authority, AuthorityConfig, RecordStore, ResolverClient,
};
use nameline_gateway::AppState;
use serde_json::Value;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::oneshot;
use tokio::time::sleep;
use tower::ServiceExt;

struct RunningRegistry {
    addr: SocketAddr,
    store: RecordStore,
    shutdown_tx: oneshot::Sender<()>,
}

impl RunningRegistry {
    fn stop(self) {
        let _ = self.shutdown_tx.send(());
    }
}

async fn spawn_registry() -> RunningRegistry {
    let config = AuthorityConfig {
        listen: "127.0.0.1:0".parse().unwrap(),
        event_channel_capacity: 16,
    };
    let store = RecordStore::new();
    let (authority, _events) = Authority::bind(&config, store.clone())
        .await
        .expect("failed to bind registry");
    let addr = authority.local_addr().expect("registry has a local address");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move { authority.run_with_shutdown(Some(shutdown_rx)).await });

    RunningRegistry {
        addr,
        store,
        shutdown_tx,
    }
}

/// Serve the real compute service router on an ephemeral TCP port.
async fn spawn_compute() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let _ = axum::serve(listener, nameline_fib::router()).await;
    });
    port
}

async fn wait_for_record(store: &RecordStore, hostname: &str) -> Option<String> {
    for _ in 0..200 {
        if let Some(address) = store.get(hostname).await {
            return Some(address);
        }
        sleep(Duration::from_millis(10)).await;
    }
    None
}

fn gateway() -> axum::Router {
    nameline_gateway::router(AppState {
        client: ResolverClient::new(),
    })
}

fn chain_uri(hostname: &str, registry: SocketAddr, compute_port: u16, number: &str) -> String {
    format!(
        "/fibonacci?hostname={hostname}&registry_addr={}&registry_port={}&compute_port={compute_port}&number={number}",
        registry.ip(),
        registry.port(),
    )
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn full_chain_resolves_and_computes() {
    let registry = spawn_registry().await;
    let compute_port = spawn_compute().await;

    send_registration("fib1", "127.0.0.1", registry.addr)
        .await
        .expect("registration datagram must send");
    assert!(wait_for_record(&registry.store, "fib1").await.is_some());

    let uri = chain_uri("fib1", registry.addr, compute_port, "10");
    let response = gateway()
        .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["fibonacci"], 55);

    registry.stop();
}

#[tokio::test]
async fn unregistered_hostname_is_a_bad_gateway() {
    let registry = spawn_registry().await;
    let compute_port = spawn_compute().await;

    let uri = chain_uri("ghost.svc", registry.addr, compute_port, "10");
    let response = gateway()
        .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .contains("not resolvable"));

    registry.stop();
}

#[tokio::test]
async fn downstream_client_error_passes_through() {
    let registry = spawn_registry().await;
    let compute_port = spawn_compute().await;

    send_registration("fib1", "127.0.0.1", registry.addr)
        .await
        .expect("registration datagram must send");
    assert!(wait_for_record(&registry.store, "fib1").await.is_some());

    // 200 overflows the 128-bit computation, so the compute service
    // answers 400 and the gateway must not rewrite that.
    let uri = chain_uri("fib1", registry.addr, compute_port, "200");
    let response = gateway()
        .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .contains("status 400"));

    registry.stop();
}

#[tokio::test]
async fn missing_parameter_is_rejected_before_any_lookup() {
    // No registry and no compute service exist; validation alone answers.
    let response = gateway()
        .oneshot(
            Request::get("/fibonacci?hostname=fib1&registry_addr=127.0.0.1&registry_port=53533&compute_port=9090")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap_or_default().contains("number"));
}

#[tokio::test]
async fn silent_registry_answers_504_within_the_timeout() {
    // Bound but never served; queries land in the buffer and rot.
    let blackhole = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let registry_addr = blackhole.local_addr().unwrap();

    let router = nameline_gateway::router(AppState {
        client: ResolverClient::with_timeouts(
            Duration::from_millis(250),
            Duration::from_secs(1),
        ),
    });

    let uri = chain_uri("fib1", registry_addr, 9090, "10");
    let started = Instant::now();
    let response = router
        .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(
        elapsed < Duration::from_secs(2),
        "timeout must bound the wait, took {elapsed:?}"
    );
    let body = json_body(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .contains("timed out"));
}

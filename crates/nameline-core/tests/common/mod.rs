//! Common utilities for the resolver contract tests
//!
//! Spins up a real Authority on an ephemeral loopback port so tests can
//! exercise the wire protocol end to end, plus small UDP helpers.

// Each contract test binary compiles this module; not every binary uses
// every helper.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use nameline_core::{Authority, AuthorityConfig, AuthorityEvent, RecordStore};

/// How long a test waits for a datagram before declaring the exchange dead
pub const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(2);

/// A running Authority with its handles
pub struct TestAuthority {
    pub addr: SocketAddr,
    pub store: RecordStore,
    pub events: mpsc::Receiver<AuthorityEvent>,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<nameline_core::Result<()>>,
}

impl TestAuthority {
    /// Signal shutdown and wait for the loop to exit cleanly.
    ///
    /// Hands back the event receiver; by this point every event the loop
    /// emitted is buffered in it.
    pub async fn stop(self) -> mpsc::Receiver<AuthorityEvent> {
        let _ = self.shutdown_tx.send(());
        let result = timeout(EXCHANGE_TIMEOUT, self.handle)
            .await
            .expect("authority did not stop in time")
            .expect("authority task panicked");
        assert!(result.is_ok(), "authority exited with error: {result:?}");
        self.events
    }
}

/// Bind an Authority on 127.0.0.1:0 and run it on a background task.
pub async fn spawn_authority() -> TestAuthority {
    let store = RecordStore::new();
    let config = AuthorityConfig {
        listen: "127.0.0.1:0".parse().expect("loopback addr"),
        event_channel_capacity: 64,
    };

    let (authority, events) = Authority::bind(&config, store.clone())
        .await
        .expect("bind authority");
    let addr = authority.local_addr().expect("local addr");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move { authority.run_with_shutdown(Some(shutdown_rx)).await });

    TestAuthority {
        addr,
        store,
        events,
        shutdown_tx,
        handle,
    }
}

/// Bind an ephemeral client socket for talking to a test authority.
pub async fn client_socket() -> UdpSocket {
    UdpSocket::bind("127.0.0.1:0").await.expect("bind client")
}

/// Send `payload` from `socket` and wait for a single reply datagram.
pub async fn exchange(socket: &UdpSocket, authority: SocketAddr, payload: &[u8]) -> Vec<u8> {
    socket
        .send_to(payload, authority)
        .await
        .expect("send datagram");

    let mut buf = [0u8; 2048];
    let (len, _) = timeout(EXCHANGE_TIMEOUT, socket.recv_from(&mut buf))
        .await
        .expect("no reply within timeout")
        .expect("recv failed");
    buf[..len].to_vec()
}

/// Poll the store until `hostname` appears or the attempts run out.
///
/// Registration forwarding is fire-and-forget, so tests that race the
/// resolver loop wait on the store instead of sleeping blindly.
pub async fn wait_for_record(store: &RecordStore, hostname: &str) -> Option<String> {
    for _ in 0..200 {
        if let Some(address) = store.get(hostname).await {
            return Some(address);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}

/// Send `payload` and assert that no reply arrives within `wait`.
pub async fn send_expecting_silence(
    socket: &UdpSocket,
    authority: SocketAddr,
    payload: &[u8],
    wait: Duration,
) {
    socket
        .send_to(payload, authority)
        .await
        .expect("send datagram");

    let mut buf = [0u8; 2048];
    let result = timeout(wait, socket.recv_from(&mut buf)).await;
    assert!(result.is_err(), "expected silence, got a reply");
}

//! Authoritative resolver
//!
//! The Authority is responsible for:
//! - Receiving registration and query datagrams over UDP
//! - Applying registrations to the shared RecordStore
//! - Answering queries, with an empty VALUE for unknown hostnames
//! - Emitting events for external monitoring
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │ UDP socket  │─── datagram ───┐
//! └─────────────┘                │
//!                                ▼
//!                       ┌──────────────┐
//!                       │  Authority   │
//!                       └──────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            │                   │                   │
//!            ▼                   ▼                   ▼
//!    ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//!    │ RecordStore │     │  UDP reply   │     │   Events    │
//!    │ (put/get)   │     │ (ack/answer) │     │  (notify)   │
//!    └─────────────┘     └──────────────┘     └─────────────┘
//! ```
//!
//! ## Request Flow
//!
//! 1. Datagram received and decoded
//! 2. Registration: upsert the store, reply with the fixed ack
//! 3. Query: look up the store, reply with the address or an empty VALUE
//! 4. Malformed: drop without replying, keep serving
//! 5. Emit event for monitoring/logging

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::AuthorityConfig;
use crate::error::Result;
use crate::proto::{self, Message};
use crate::store::RecordStore;

/// Largest request datagram the resolver will read
const MAX_DATAGRAM: usize = 4096;

/// Events emitted by the Authority
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorityEvent {
    /// Resolver started listening
    Started { listen: SocketAddr },

    /// A registration was applied to the store
    RegistrationApplied {
        hostname: String,
        address: String,
        previous: Option<String>,
    },

    /// A query was answered. `found` is false when the reply carried an
    /// empty VALUE.
    QueryAnswered { hostname: String, found: bool },

    /// A datagram failed to decode and was dropped without a reply
    MalformedDropped { peer: SocketAddr },

    /// Resolver stopped
    Stopped { reason: String },
}

/// Authoritative resolver
///
/// Owns the UDP socket and a handle to the shared record store. The loop
/// serves one datagram at a time; with an in-memory store every request
/// completes in microseconds, so there is no per-request task fanout.
///
/// ## Lifecycle
///
/// 1. Create with [`Authority::bind()`]
/// 2. Start with [`Authority::run()`]
/// 3. Runs until a shutdown signal is received
///
/// ## Load Resistance
///
/// - **Bounded event channel**: when full, events are dropped (logged)
/// - **Malformed input**: dropped without reply, never kills the loop
pub struct Authority {
    /// Bound UDP socket
    socket: UdpSocket,

    /// Shared hostname -> address records
    store: RecordStore,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<AuthorityEvent>,
}

impl Authority {
    /// Bind the resolver socket.
    ///
    /// A failure to bind is the only fatal startup condition; callers are
    /// expected to abort on `Err` rather than retry.
    ///
    /// # Returns
    ///
    /// A tuple of (authority, event_receiver) where event_receiver yields
    /// resolver events.
    pub async fn bind(
        config: &AuthorityConfig,
        store: RecordStore,
    ) -> Result<(Self, mpsc::Receiver<AuthorityEvent>)> {
        config.validate()?;

        let socket = UdpSocket::bind(config.listen).await?;
        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let authority = Self {
            socket,
            store,
            event_tx: tx,
        };

        Ok((authority, rx))
    }

    /// Local address of the bound socket.
    ///
    /// Useful when binding to port 0 and the real port is needed.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Run the resolver loop
    ///
    /// Serves datagrams until a shutdown signal is received.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: Fatal error
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Internal run implementation that accepts an optional shutdown signal
    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        let listen = self.socket.local_addr()?;
        self.emit_event(AuthorityEvent::Started { listen });
        info!("Authoritative resolver listening on udp://{}", listen);

        let mut buf = [0u8; MAX_DATAGRAM];

        // Main datagram loop
        if let Some(mut rx) = shutdown_rx {
            // Test mode: wait for provided shutdown signal
            loop {
                tokio::select! {
                    received = self.socket.recv_from(&mut buf) => {
                        match received {
                            Ok((len, peer)) => self.handle_datagram(&buf[..len], peer).await,
                            Err(e) => warn!("Failed to receive datagram: {}", e),
                        }
                    }

                    _ = &mut rx => {
                        info!("Shutdown signal received");
                        self.emit_event(AuthorityEvent::Stopped {
                            reason: "Shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        } else {
            // Production mode: wait for SIGINT
            loop {
                tokio::select! {
                    received = self.socket.recv_from(&mut buf) => {
                        match received {
                            Ok((len, peer)) => self.handle_datagram(&buf[..len], peer).await,
                            Err(e) => warn!("Failed to receive datagram: {}", e),
                        }
                    }

                    _ = tokio::signal::ctrl_c() => {
                        info!("Shutdown signal received");
                        self.emit_event(AuthorityEvent::Stopped {
                            reason: "Shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        }

        info!("Resolver stopped");
        Ok(())
    }

    /// Handle one decoded-or-dropped datagram
    async fn handle_datagram(&self, data: &[u8], peer: SocketAddr) {
        match Message::decode(data) {
            Ok(Message::Registration { hostname, address }) => {
                let previous = self.store.put(&hostname, &address).await;
                info!("Registered {} -> {}", hostname, address);

                if let Err(e) = self.socket.send_to(proto::REGISTRATION_ACK, peer).await {
                    warn!("Failed to send registration ack to {}: {}", peer, e);
                }

                self.emit_event(AuthorityEvent::RegistrationApplied {
                    hostname,
                    address,
                    previous,
                });
            }

            Ok(Message::Query { hostname }) => {
                let address = self.store.get(&hostname).await;
                let found = address.is_some();
                if found {
                    debug!("Answering query for {}", hostname);
                } else {
                    debug!("No record for {}, answering with empty value", hostname);
                }

                let reply =
                    proto::encode_query_response(&hostname, address.as_deref().unwrap_or(""));
                if let Err(e) = self.socket.send_to(&reply, peer).await {
                    warn!("Failed to send query response to {}: {}", peer, e);
                }

                self.emit_event(AuthorityEvent::QueryAnswered { hostname, found });
            }

            Err(e) => {
                warn!("Dropping malformed datagram from {}: {}", peer, e);
                self.emit_event(AuthorityEvent::MalformedDropped { peer });
            }
        }
    }

    /// Emit a resolver event
    fn emit_event(&self, event: AuthorityEvent) {
        // Nobody listening is fine; demos and tests may drop the receiver.
        if self.event_tx.is_closed() {
            return;
        }

        // Send event, logging a warning if the channel is full (backpressure)
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }

    /// Run the resolver with a controlled shutdown signal.
    ///
    /// The daemon, the demos, and the contract tests use this to stop
    /// the loop deterministically alongside other servers. [`Authority::run`]
    /// is the standalone variant that ties shutdown to OS signals.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }
}

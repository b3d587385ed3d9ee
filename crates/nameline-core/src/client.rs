//! Resolution client
//!
//! Queries the registry for a hostname and, on success, calls the compute
//! endpoint at the resolved address. Both legs are bounded by timeouts so
//! a silent registry or a hung endpoint can never park a caller forever.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::debug;

use crate::bridge;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::proto::{self, QueryResponse};

/// Largest reply datagram the client will read
const MAX_REPLY: usize = 1024;

/// Response body of the compute endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeResponse {
    /// The requested Fibonacci number
    pub fibonacci: u128,
}

/// Resolution client
///
/// Cheap to clone; the underlying HTTP client shares its connection pool
/// across clones. Every registry query binds a fresh ephemeral UDP socket
/// that is dropped on all paths, success or failure.
#[derive(Debug, Clone)]
pub struct ResolverClient {
    query_timeout: Duration,
    call_timeout: Duration,
    http: reqwest::Client,
}

impl ResolverClient {
    /// Create a client with the default timeouts
    pub fn new() -> Self {
        Self::with_config(&ClientConfig::default())
    }

    /// Create a client from a configuration
    pub fn with_config(config: &ClientConfig) -> Self {
        Self::with_timeouts(config.query_timeout(), config.call_timeout())
    }

    /// Create a client with explicit timeouts
    pub fn with_timeouts(query_timeout: Duration, call_timeout: Duration) -> Self {
        Self {
            query_timeout,
            call_timeout,
            http: reqwest::Client::builder()
                .timeout(call_timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Resolve `hostname` through the registry at `registry`.
    ///
    /// # Returns
    ///
    /// - `Ok(address)`: the registered address
    /// - `Err(UnresolvedHostname)`: the registry answered with an empty VALUE
    /// - `Err(QueryTimeout)`: no reply within the query timeout
    /// - `Err(MalformedMessage)`: the reply did not decode
    /// - `Err(Transport)`: socket failure
    pub async fn resolve(&self, hostname: &str, registry: SocketAddr) -> Result<String> {
        let socket = UdpSocket::bind(bridge::local_bind_addr(registry)).await?;
        socket
            .send_to(&proto::encode_query(hostname), registry)
            .await?;

        let mut buf = [0u8; MAX_REPLY];
        let (len, _) = timeout(self.query_timeout, socket.recv_from(&mut buf))
            .await
            .map_err(|_| Error::QueryTimeout)??;

        let response = QueryResponse::decode(&buf[..len])?;
        debug!("Query for {} answered: {:?}", hostname, response.address);

        response
            .address
            .ok_or_else(|| Error::UnresolvedHostname(hostname.to_string()))
    }

    /// Resolve `hostname`, then fetch Fibonacci number `number` from the
    /// compute endpoint at the resolved address.
    ///
    /// The resolved address is used exactly as registered; no DNS lookup
    /// happens on the HTTP leg.
    pub async fn resolve_and_call(
        &self,
        hostname: &str,
        registry: SocketAddr,
        compute_port: u16,
        number: u64,
    ) -> Result<u128> {
        let address = self.resolve(hostname, registry).await?;
        let url = compute_url(&address, compute_port);
        debug!("Calling compute endpoint {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[("number", number)])
            .timeout(self.call_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::DownstreamTimeout
                } else {
                    Error::Transport(io::Error::other(e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::DownstreamStatus(status.as_u16()));
        }

        // The call timeout keeps running through the body read, so its
        // expiry here is classified the same way as on the send.
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                Error::DownstreamTimeout
            } else {
                Error::Transport(io::Error::other(e))
            }
        })?;
        let decoded: ComputeResponse = serde_json::from_str(&body)?;
        Ok(decoded.fibonacci)
    }
}

impl Default for ResolverClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the compute endpoint URL, bracketing IPv6 literals.
fn compute_url(address: &str, port: u16) -> String {
    if address.contains(':') {
        format!("http://[{address}]:{port}/fibonacci")
    } else {
        format!("http://{address}:{port}/fibonacci")
    }
}

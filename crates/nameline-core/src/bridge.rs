//! Registration bridge
//!
//! Turns structured registration requests, as accepted by the HTTP
//! surfaces, into wire datagrams for the registry. Validation happens
//! here so handlers can reject bad input before any socket is touched.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use serde::{Deserialize, Serialize};
use tokio::net::UdpSocket;
use tracing::debug;

use crate::error::{Error, Result};
use crate::proto;

/// A structured registration request.
///
/// Every field is required; [`RegisterRequest::validate`] turns a complete
/// request into a [`ValidRegistration`] and rejects anything missing,
/// empty, or unparsable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Hostname to register
    pub hostname: Option<String>,
    /// Address the hostname should resolve to
    pub address: Option<String>,
    /// IP address of the registry to forward the registration to
    pub registry_addr: Option<String>,
    /// UDP port of the registry
    pub registry_port: Option<u16>,
}

/// A validated registration, ready to forward
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub hostname: String,
    pub address: String,
    pub registry: SocketAddr,
}

impl RegisterRequest {
    /// Check the request for completeness and parse the registry endpoint.
    pub fn validate(&self) -> Result<ValidRegistration> {
        let hostname = required(&self.hostname, "hostname")?;
        let address = required(&self.address, "address")?;
        let registry_addr = required(&self.registry_addr, "registry_addr")?;
        let registry_port = self
            .registry_port
            .ok_or_else(|| Error::validation("missing field registry_port"))?;

        if registry_port == 0 {
            return Err(Error::validation("registry_port must be non-zero"));
        }
        let ip: IpAddr = registry_addr.parse().map_err(|_| {
            Error::validation(format!("registry_addr {registry_addr:?} is not an IP address"))
        })?;

        Ok(ValidRegistration {
            hostname,
            address,
            registry: SocketAddr::new(ip, registry_port),
        })
    }
}

fn required(field: &Option<String>, name: &str) -> Result<String> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(Error::validation(format!("missing field {name}"))),
    }
}

/// Forward a registration datagram to the registry.
///
/// Fire-and-forget: the acknowledgement the registry sends back is
/// informational and not awaited. An `Ok` here means the datagram left
/// this host, not that the registry applied it.
pub async fn send_registration(hostname: &str, address: &str, registry: SocketAddr) -> Result<()> {
    let payload = proto::encode_registration(hostname, address);
    let socket = UdpSocket::bind(local_bind_addr(registry)).await?;
    socket.send_to(&payload, registry).await?;
    debug!("forwarded registration {} -> {} to {}", hostname, address, registry);
    Ok(())
}

/// Ephemeral local address in the same family as the peer.
pub(crate) fn local_bind_addr(peer: SocketAddr) -> SocketAddr {
    if peer.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    }
}

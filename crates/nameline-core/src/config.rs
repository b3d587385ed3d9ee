//! Configuration types for the nameline system
//!
//! This module defines the configuration structures shared by the
//! authoritative resolver and the resolution client.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default UDP port of the authoritative resolver
pub const DEFAULT_REGISTRY_PORT: u16 = 53533;

/// Authoritative resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorityConfig {
    /// UDP address the resolver listens on
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Capacity of the internal event channel
    ///
    /// When full, new resolver events will be dropped (with a warning log).
    /// This prevents unbounded memory growth under high request churn.
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl AuthorityConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_REGISTRY_PORT)
}

fn default_event_channel_capacity() -> usize {
    1000
}

/// Resolution client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// How long to wait for a registry reply (in seconds)
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// How long to wait for the downstream compute call (in seconds)
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

impl ClientConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.query_timeout_secs == 0 {
            return Err(crate::Error::config("Query timeout must be > 0"));
        }
        if self.call_timeout_secs == 0 {
            return Err(crate::Error::config("Call timeout must be > 0"));
        }
        Ok(())
    }

    /// Registry query timeout as a Duration
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Downstream call timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            query_timeout_secs: default_query_timeout_secs(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

fn default_query_timeout_secs() -> u64 {
    5
}

fn default_call_timeout_secs() -> u64 {
    5
}

// # nameline-core
//
// Core library for the nameline name-resolution service.
//
// ## Architecture Overview
//
// This library provides the moving parts of a minimal authoritative
// registry and its clients:
// - **proto**: line-oriented KEY=VALUE wire codec
// - **RecordStore**: shared in-memory hostname -> address map
// - **Authority**: UDP resolver loop that applies registrations and
//   answers queries
// - **bridge**: validation and forwarding of structured registrations
// - **ResolverClient**: query-then-call chain with bounded timeouts
//
// ## Design Principles
//
// 1. **In-band absence**: unknown hostnames answer with an empty VALUE,
//    never an error or a dropped reply
// 2. **Last write wins**: registration is an unconditional upsert
// 3. **Strict decode, exact encode**: the codec rejects what it does not
//    understand but never varies the bytes it produces
// 4. **Library-First**: daemons are thin shells over these types

pub mod authority;
pub mod bridge;
pub mod client;
pub mod config;
pub mod error;
pub mod proto;
pub mod store;

// Re-export core types for convenience
pub use authority::{Authority, AuthorityEvent};
pub use bridge::{send_registration, RegisterRequest, ValidRegistration};
pub use client::{ComputeResponse, ResolverClient};
pub use config::{AuthorityConfig, ClientConfig, DEFAULT_REGISTRY_PORT};
pub use error::{Error, Result};
pub use store::RecordStore;

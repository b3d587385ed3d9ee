//! Wire protocol for the nameline registry
//!
//! Every datagram is a run of newline-terminated `KEY=VALUE` lines. Three
//! shapes exist:
//!
//! - registration: `TYPE=A`, `NAME=<hostname>`, `VALUE=<address>`, `TTL=10`
//! - query: `TYPE=A`, `NAME=<hostname>`
//! - query response: same byte layout as a registration
//!
//! A request is classified by its structure, never by substring probes:
//! the first line must be exactly `TYPE=A`, and the following lines must
//! carry the expected keys. A query response with an empty `VALUE` is the
//! in-band "unknown hostname" answer.

use crate::error::{Error, Result};

/// Fixed, informational TTL stamped on registrations and responses.
/// Records never expire; nothing enforces this value.
pub const RECORD_TTL: u32 = 10;

/// Acknowledgement payload the registry sends for an applied registration.
pub const REGISTRATION_ACK: &[u8] = b"Registration successful";

const TYPE_LINE: &str = "TYPE=A";

/// Encode a registration datagram for `hostname` -> `address`.
pub fn encode_registration(hostname: &str, address: &str) -> Vec<u8> {
    format!("TYPE=A\nNAME={hostname}\nVALUE={address}\nTTL={RECORD_TTL}\n").into_bytes()
}

/// Encode a query datagram for `hostname`.
pub fn encode_query(hostname: &str) -> Vec<u8> {
    format!("TYPE=A\nNAME={hostname}\n").into_bytes()
}

/// Encode a query response. An unknown hostname is answered with an
/// empty `address`, keeping the line layout intact.
pub fn encode_query_response(hostname: &str, address: &str) -> Vec<u8> {
    format!("TYPE=A\nNAME={hostname}\nVALUE={address}\nTTL={RECORD_TTL}\n").into_bytes()
}

/// A decoded request datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Upsert of a hostname -> address mapping.
    Registration { hostname: String, address: String },
    /// Lookup of the address registered for a hostname.
    Query { hostname: String },
}

impl Message {
    /// Decode a request datagram.
    ///
    /// A two-line message is a query, a message of three or more lines is a
    /// registration. Lines past `VALUE` (the informational TTL) are ignored.
    /// Anything else, including non-UTF-8 payloads and lines that are not
    /// `KEY=VALUE`, is malformed.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let lines = split_lines(data)?;

        match lines.len() {
            2 => {
                let hostname = field(lines[1], "NAME")?;
                Ok(Message::Query { hostname })
            }
            n if n >= 3 => {
                let hostname = field(lines[1], "NAME")?;
                let address = field(lines[2], "VALUE")?;
                Ok(Message::Registration { hostname, address })
            }
            _ => Err(Error::malformed("truncated message")),
        }
    }
}

/// A decoded query response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponse {
    /// Hostname echoed back by the registry.
    pub hostname: String,
    /// Resolved address. `None` when the registry answered with an empty
    /// `VALUE`, the in-band signal for an unknown hostname.
    pub address: Option<String>,
    /// Advisory TTL, tolerated if absent or unparsable.
    pub ttl: Option<u32>,
}

impl QueryResponse {
    /// Decode a query response datagram. Unknown keys are ignored so the
    /// format can grow without breaking old clients.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let lines = split_lines(data)?;

        let mut hostname = None;
        let mut address = None;
        let mut ttl = None;
        for line in &lines[1..] {
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| Error::malformed(format!("line {line:?} is not KEY=VALUE")))?;
            match key {
                "NAME" => hostname = Some(value.trim().to_string()),
                "VALUE" => address = Some(value.trim().to_string()),
                "TTL" => ttl = value.trim().parse().ok(),
                _ => {}
            }
        }

        let hostname = hostname.ok_or_else(|| Error::malformed("response missing NAME"))?;
        Ok(QueryResponse {
            hostname,
            address: address.filter(|a| !a.is_empty()),
            ttl,
        })
    }
}

/// Split a datagram into trimmed lines and check the leading type line.
fn split_lines(data: &[u8]) -> Result<Vec<&str>> {
    let text = std::str::from_utf8(data).map_err(|_| Error::malformed("payload is not UTF-8"))?;

    let mut lines: Vec<&str> = text.split('\n').map(str::trim).collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    match lines.first() {
        Some(&TYPE_LINE) => Ok(lines),
        Some(first) => Err(Error::malformed(format!(
            "unsupported type line {first:?}"
        ))),
        None => Err(Error::malformed("empty payload")),
    }
}

/// Extract the value of a `KEY=VALUE` line, insisting on the expected key.
fn field(line: &str, key: &str) -> Result<String> {
    let (k, v) = line
        .split_once('=')
        .ok_or_else(|| Error::malformed(format!("line {line:?} is not KEY=VALUE")))?;
    if k != key {
        return Err(Error::malformed(format!("expected {key} line, got {k:?}")));
    }
    Ok(v.trim().to_string())
}

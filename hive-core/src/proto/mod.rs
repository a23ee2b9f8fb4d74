//! Structured RPC payload definitions for the drone control protocol.
//!
//! Each sub-module defines the request/response payloads for one domain
//! (ports, streams, stats, capture). Payloads are serialized with
//! `serde` + `bincode` and carried inside [`Frame`] bodies.
//!
//! [`Frame`]: crate::frame::Frame

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::HiveError;

pub mod capture;
pub mod port;
pub mod stats;
pub mod stream;

// Re-export the most commonly used types at the proto level.
pub use capture::{CaptureBuffer, CaptureFormat};
pub use port::{select_loopback_port, PortIdList, PortInfo};
pub use stats::PortStats;
pub use stream::{ProtocolLayer, StreamBuilder, StreamConfig, StreamConfigList, StreamIdList};

// ── Wire helpers ─────────────────────────────────────────────────

/// Serialize a payload structure for transport.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, HiveError> {
    bincode::serialize(value).map_err(|e| HiveError::Encoding(e.to_string()))
}

/// Deserialize a payload structure received from the drone.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, HiveError> {
    bincode::deserialize(bytes).map_err(|e| HiveError::Encoding(e.to_string()))
}

// ── Handshake ────────────────────────────────────────────────────

/// Protocol version spoken by this client. Checked during the Hello
/// exchange; the drone rejects or the client aborts on mismatch.
pub const PROTOCOL_VERSION: u32 = 1;

/// Payload of a `Hello` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hello {
    /// Version the sender speaks.
    pub version: u32,
    /// Free-form software identification, e.g. `"hive-ctl/0.2.0"`.
    pub agent: String,
}

impl Hello {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            agent: agent.into(),
        }
    }
}

// ── Faults ───────────────────────────────────────────────────────

/// Payload of an `ERROR`-flagged response: why the call failed remotely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RpcFault {
    pub message: String,
}

impl RpcFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_carries_current_version() {
        let hello = Hello::new("hive-ctl/0.2.0");
        assert_eq!(hello.version, PROTOCOL_VERSION);

        let bytes = encode(&hello).unwrap();
        let back: Hello = decode(&bytes).unwrap();
        assert_eq!(back, hello);
    }

    #[test]
    fn fault_roundtrip() {
        let fault = RpcFault::new("port 9 does not exist");
        let bytes = encode(&fault).unwrap();
        let back: RpcFault = decode(&bytes).unwrap();
        assert_eq!(back.message, "port 9 does not exist");
    }

    #[test]
    fn decode_garbage_is_typed_error() {
        let result: Result<Hello, _> = decode(&[0xFF, 0xFE]);
        assert!(matches!(result, Err(HiveError::Encoding(_))));
    }
}

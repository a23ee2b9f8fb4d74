//! Protocol message types and RPC method definitions.
//!
//! Uses proper enums with `TryFrom` — no panics on unknown values.

use crate::error::HiveError;
use std::fmt;

// ── MessageType ──────────────────────────────────────────────────

/// Distinguishes requests (client → drone) from responses (drone → client).
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// A call sent from the client to the drone.
    Request = 0x1,
    /// A reply sent from the drone to the client.
    Response = 0x2,
}

impl TryFrom<u32> for MessageType {
    type Error = HiveError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0x1 => Ok(MessageType::Request),
            0x2 => Ok(MessageType::Response),
            _ => Err(HiveError::UnknownVariant {
                type_name: "MessageType",
                value: value as u64,
            }),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::Request => write!(f, "Request"),
            MessageType::Response => write!(f, "Response"),
        }
    }
}

// ── Method ───────────────────────────────────────────────────────

/// All RPC methods understood by the drone control protocol.
///
/// Organized by category:
/// - `0x0001..0x00FF` — Protocol-level (handshake, heartbeat)
/// - `0x0100..0x01FF` — Port discovery
/// - `0x0200..0x02FF` — Stream lifecycle
/// - `0x0300..0x03FF` — Transmit / capture control
/// - `0x0400..0x04FF` — Statistics
/// - `0x0500..0x05FF` — Capture retrieval
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    // ── Protocol (0x00xx) ────────────────────────────────────────
    /// Connection handshake; carries the protocol version.
    Hello = 0x0001,
    /// Graceful disconnect.
    Goodbye = 0x0002,
    /// Periodic keep-alive.
    Heartbeat = 0x0003,

    // ── Port (0x01xx) ────────────────────────────────────────────
    /// List the identifiers of all ports on the drone.
    GetPortIdList = 0x0101,
    /// Fetch name/description metadata for a set of ports.
    GetPortConfig = 0x0102,

    // ── Stream (0x02xx) ──────────────────────────────────────────
    /// Register a stream id on a port.
    AddStream = 0x0201,
    /// Push the full configuration of previously added streams.
    ModifyStream = 0x0202,
    /// Remove streams from a port.
    DeleteStream = 0x0203,

    // ── Traffic (0x03xx) ─────────────────────────────────────────
    /// Start transmitting configured streams on a set of ports.
    StartTransmit = 0x0301,
    /// Stop transmitting on a set of ports.
    StopTransmit = 0x0302,
    /// Start capturing received packets on a set of ports.
    StartCapture = 0x0303,
    /// Stop capturing on a set of ports.
    StopCapture = 0x0304,

    // ── Stats (0x04xx) ───────────────────────────────────────────
    /// Zero the counters on a set of ports.
    ClearStats = 0x0401,
    /// Fetch a counter snapshot for a set of ports.
    GetStats = 0x0402,

    // ── Capture retrieval (0x05xx) ───────────────────────────────
    /// Fetch the capture buffer recorded on a port.
    GetCaptureBuffer = 0x0501,
}

impl TryFrom<u64> for Method {
    type Error = HiveError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0x0001 => Ok(Method::Hello),
            0x0002 => Ok(Method::Goodbye),
            0x0003 => Ok(Method::Heartbeat),

            0x0101 => Ok(Method::GetPortIdList),
            0x0102 => Ok(Method::GetPortConfig),

            0x0201 => Ok(Method::AddStream),
            0x0202 => Ok(Method::ModifyStream),
            0x0203 => Ok(Method::DeleteStream),

            0x0301 => Ok(Method::StartTransmit),
            0x0302 => Ok(Method::StopTransmit),
            0x0303 => Ok(Method::StartCapture),
            0x0304 => Ok(Method::StopCapture),

            0x0401 => Ok(Method::ClearStats),
            0x0402 => Ok(Method::GetStats),

            0x0501 => Ok(Method::GetCaptureBuffer),

            _ => Err(HiveError::UnknownVariant {
                type_name: "Method",
                value,
            }),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Method {
    /// Returns `true` if this method expects a response from the drone.
    pub fn expects_response(&self) -> bool {
        !matches!(self, Method::Heartbeat | Method::Goodbye)
    }
}

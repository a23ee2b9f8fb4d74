//! Domain-specific error types for the hive control protocol.
//!
//! All fallible operations return `Result<T, HiveError>`.
//! No panics on invalid input — every error is typed and recoverable.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::message::Method;

/// The canonical error type for the hive client.
#[derive(Debug, Error)]
pub enum HiveError {
    // ── Protocol Errors ──────────────────────────────────────────
    /// Received bytes that do not start with the HIV0 magic sequence.
    #[error("invalid magic bytes: expected HIV0")]
    InvalidMagic,

    /// A field in the frame header could not be parsed.
    #[error("invalid header: {0}")]
    InvalidHeader(&'static str),

    /// The frame payload failed checksum verification.
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// A numeric value did not map to any known enum variant.
    #[error("unknown {type_name} discriminant: {value:#x}")]
    UnknownVariant { type_name: &'static str, value: u64 },

    /// The protocol version offered by the drone is not supported.
    #[error("unsupported protocol version: drone speaks {remote}, client speaks {local}")]
    UnsupportedVersion { local: u32, remote: u32 },

    // ── Frame Errors ─────────────────────────────────────────────
    /// The payload exceeds the configured maximum size.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Frame size exceeded the codec limit.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    // ── Connection Errors ────────────────────────────────────────
    /// The TCP/IO layer reported an error. Connection failures are
    /// fatal to the whole workflow; there is no automatic retry.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// An mpsc channel was closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,

    /// An RPC call exceeded its deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    // ── Serialization Errors ─────────────────────────────────────
    /// Encoding or decoding of a payload failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    // ── Remote Errors ────────────────────────────────────────────
    /// The drone rejected or failed a remote call.
    #[error("rpc {method} failed: {message}")]
    Rpc { method: Method, message: String },

    // ── Configuration Input Errors ───────────────────────────────
    /// A stream field value does not fit its wire width.
    #[error("{field} out of range: {value:#x} (max {max:#x})")]
    Range {
        field: &'static str,
        value: u64,
        max: u64,
    },

    /// A hex payload string could not be decoded.
    #[error("format error: {0}")]
    Format(String),

    // ── Workflow Errors ──────────────────────────────────────────
    /// The drone reported an empty port list.
    #[error("drone has no ports")]
    NoPorts,

    /// No port with loopback capability was found.
    #[error("no loopback port among the drone's ports")]
    NoLoopbackPort,

    /// An operation was attempted from the wrong session state.
    #[error("workflow violation: {0}")]
    WorkflowViolation(&'static str),

    /// The caller cancelled the run mid-wait.
    #[error("run cancelled")]
    Cancelled,

    // ── Local Persistence Errors ─────────────────────────────────
    /// Writing a capture buffer to disk failed.
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for HiveError {
    fn from(s: String) -> Self {
        HiveError::Other(s)
    }
}

impl From<&str> for HiveError {
    fn from(s: &str) -> Self {
        HiveError::Other(s.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for HiveError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        HiveError::ChannelClosed
    }
}

impl From<Box<bincode::ErrorKind>> for HiveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        HiveError::Encoding(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = HiveError::InvalidMagic;
        assert!(e.to_string().contains("magic"));

        let e = HiveError::PayloadTooLarge {
            size: 1000,
            max: 500,
        };
        assert!(e.to_string().contains("1000"));
        assert!(e.to_string().contains("500"));

        let e = HiveError::Range {
            field: "dst_mac",
            value: 1 << 48,
            max: (1 << 48) - 1,
        };
        assert!(e.to_string().contains("dst_mac"));
    }

    #[test]
    fn from_string() {
        let e: HiveError = "something broke".into();
        assert!(matches!(e, HiveError::Other(_)));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let e: HiveError = io_err.into();
        assert!(matches!(e, HiveError::Connection(_)));
    }

    #[test]
    fn rpc_error_names_method() {
        let e = HiveError::Rpc {
            method: Method::ModifyStream,
            message: "no such stream".into(),
        };
        let text = e.to_string();
        assert!(text.contains("ModifyStream"));
        assert!(text.contains("no such stream"));
    }
}

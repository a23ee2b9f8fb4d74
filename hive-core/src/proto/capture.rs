//! Capture buffer retrieval and persistence.
//!
//! The drone records received packets per port; `GetCaptureBuffer`
//! returns the recording as an opaque blob. The client persists it
//! verbatim for external tooling and never interprets the contents.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HiveError;
use crate::ident::PortId;

/// On-disk format of a capture buffer, as declared by the drone.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum CaptureFormat {
    /// Classic libpcap capture file.
    #[default]
    Pcap,
}

/// An immutable capture recording fetched from one port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptureBuffer {
    pub port_id: PortId,
    pub format: CaptureFormat,
    /// Raw file bytes, opaque to this client.
    pub data: Vec<u8>,
}

impl CaptureBuffer {
    pub fn new(port_id: PortId, format: CaptureFormat, data: Vec<u8>) -> Self {
        Self {
            port_id,
            format,
            data,
        }
    }

    /// Size of the recording in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write the recording verbatim to `path`.
    pub fn persist(&self, path: &Path) -> Result<(), HiveError> {
        std::fs::write(path, &self.data).map_err(|source| HiveError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

//! Opaque identifier newtypes.
//!
//! Port and stream ids live in different id spaces on the drone; the
//! newtypes keep them from being mixed up at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a physical or virtual port on the drone.
///
/// Values are discovered via port listing, never invented by the client.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PortId(pub u32);

impl PortId {
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port {}", self.0)
    }
}

/// Identifier of a packet stream, scoped to the port it was added on.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct StreamId(pub u32);

impl StreamId {
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream {}", self.0)
    }
}

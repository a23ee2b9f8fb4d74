//! Port counter snapshots.

use serde::{Deserialize, Serialize};

use crate::ident::PortId;

/// Immutable snapshot of one port's counters at fetch time.
///
/// Produced only by an explicit `GetStats` call; the client never
/// updates a snapshot in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortStats {
    pub port_id: PortId,
    pub tx_pkts: u64,
    pub tx_bytes: u64,
    /// Transmit rate, packets per second, at snapshot time.
    pub tx_pps: u64,
    pub rx_pkts: u64,
    pub rx_bytes: u64,
    /// Receive rate, packets per second, at snapshot time.
    pub rx_pps: u64,
}

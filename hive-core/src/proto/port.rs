//! Port discovery payloads and default port selection.

use serde::{Deserialize, Serialize};

use crate::ident::PortId;

/// Request/response payload carrying a set of port ids.
///
/// Used by `GetPortConfig`, `ClearStats`, `GetStats` and the four
/// transmit/capture control calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortIdList {
    pub ids: Vec<PortId>,
}

impl PortIdList {
    pub fn new(ids: Vec<PortId>) -> Self {
        Self { ids }
    }

    /// A list holding a single port.
    pub fn single(id: PortId) -> Self {
        Self { ids: vec![id] }
    }
}

/// Metadata for one drone port, as returned by `GetPortConfig`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortInfo {
    pub id: PortId,
    /// Interface name, e.g. `"eth0"` or `"lo"`.
    pub name: String,
    /// Human-readable description, e.g. `"Loopback device"`.
    pub description: String,
}

impl PortInfo {
    pub fn new(id: PortId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
        }
    }

    /// Whether this port looks like a loopback interface: `"lo"` in the
    /// name or `"loopback"` in the description, case-insensitive.
    pub fn is_loopback(&self) -> bool {
        self.name.to_ascii_lowercase().contains("lo")
            || self.description.to_ascii_lowercase().contains("loopback")
    }
}

/// Pick the first loopback-capable port, if any.
///
/// Used as the default tx/rx port when the caller supplies no explicit
/// selection.
pub fn select_loopback_port(ports: &[PortInfo]) -> Option<PortId> {
    ports.iter().find(|p| p.is_loopback()).map(|p| p.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_selected_by_name() {
        let ports = vec![
            PortInfo::new(PortId(1), "eth0", ""),
            PortInfo::new(PortId(2), "lo", "loopback"),
        ];
        assert_eq!(select_loopback_port(&ports), Some(PortId(2)));
    }

    #[test]
    fn loopback_selected_by_description() {
        let ports = vec![
            PortInfo::new(PortId(4), "if4", "Software Loopback Interface"),
            PortInfo::new(PortId(5), "eth1", "uplink"),
        ];
        assert_eq!(select_loopback_port(&ports), Some(PortId(4)));
    }

    #[test]
    fn first_match_wins() {
        let ports = vec![
            PortInfo::new(PortId(1), "lo0", "loopback"),
            PortInfo::new(PortId(2), "lo1", "loopback"),
        ];
        assert_eq!(select_loopback_port(&ports), Some(PortId(1)));
    }

    #[test]
    fn no_loopback_returns_none() {
        let ports = vec![
            PortInfo::new(PortId(1), "eth0", "front panel"),
            PortInfo::new(PortId(2), "eth1", "rear panel"),
        ];
        assert_eq!(select_loopback_port(&ports), None);
        assert_eq!(select_loopback_port(&[]), None);
    }

    #[test]
    fn match_is_case_insensitive() {
        let ports = vec![PortInfo::new(PortId(3), "LO", "LOOPBACK ADAPTER")];
        assert_eq!(select_loopback_port(&ports), Some(PortId(3)));
    }

    #[test]
    fn port_id_list_single() {
        let list = PortIdList::single(PortId(7));
        assert_eq!(list.ids, vec![PortId(7)]);
    }
}

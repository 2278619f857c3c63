use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::common::entity::TransportProtocol;

// ── Flow tuple ──────────────────────────────────────────────────────

/// One side of an observed flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub addr: IpAddr,
    /// Present for TCP and UDP only.
    pub port: Option<u16>,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.addr, self.port) {
            (IpAddr::V6(addr), Some(port)) => write!(f, "[{addr}]:{port}"),
            (addr, Some(port)) => write!(f, "{addr}:{port}"),
            (addr, None) => write!(f, "{addr}"),
        }
    }
}

/// Diagnostic summary of one observed packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowTuple {
    pub protocol: TransportProtocol,
    pub src: Endpoint,
    pub dst: Endpoint,
    /// Innermost 802.1Q VLAN id, if the frame was tagged.
    pub vlan_id: Option<u16>,
}

impl FlowTuple {
    /// Label used in logs: `TCP`, `UDP`, `ICMP` (v4 and v6), or the
    /// decimal protocol number.
    pub fn protocol_label(&self) -> String {
        match self.protocol {
            TransportProtocol::Tcp => "TCP".to_string(),
            TransportProtocol::Udp => "UDP".to_string(),
            TransportProtocol::Icmp | TransportProtocol::Icmpv6 => "ICMP".to_string(),
            TransportProtocol::Other(n) => n.to_string(),
        }
    }

    pub fn is_ipv6(&self) -> bool {
        self.src.addr.is_ipv6()
    }
}

impl fmt::Display for FlowTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PROTO:{} SRC:{} DST:{}",
            self.protocol_label(),
            self.src,
            self.dst
        )
    }
}

// ── Flow statistics ─────────────────────────────────────────────────

/// Counters for one installed rule, as reported by the datapath.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStatsEntry {
    /// Datapath's description of the rule's match.
    #[serde(default)]
    pub match_fields: String,
    #[serde(default)]
    pub packet_count: u64,
    #[serde(default)]
    pub byte_count: u64,
    #[serde(default)]
    pub duration_sec: u32,
}

/// Totals over one statistics report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowStatsSummary {
    pub flows: usize,
    pub packets: u64,
    pub bytes: u64,
}

impl FlowStatsSummary {
    pub fn from_entries(entries: &[FlowStatsEntry]) -> Self {
        entries.iter().fold(
            Self {
                flows: entries.len(),
                ..Self::default()
            },
            |acc, e| Self {
                packets: acc.packets.saturating_add(e.packet_count),
                bytes: acc.bytes.saturating_add(e.byte_count),
                ..acc
            },
        )
    }
}

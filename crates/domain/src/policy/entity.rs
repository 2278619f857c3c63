use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::common::entity::EnforcementPointId;

use super::error::PolicyError;

// ── Field names ─────────────────────────────────────────────────────

/// The closed set of match fields a policy may constrain.
///
/// Variants are declared in lexicographic order of their canonical names,
/// so the derived `Ord` sorts fields by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldName {
    #[serde(rename = "link-layer-destination-address", alias = "dl_dst")]
    DstMac,
    #[serde(rename = "link-layer-ethertype", alias = "dl_type")]
    EtherType,
    #[serde(rename = "link-layer-source-address", alias = "dl_src")]
    SrcMac,
    #[serde(rename = "network-destination-address", alias = "nw_dst")]
    DstIp,
    #[serde(rename = "network-source-address", alias = "nw_src")]
    SrcIp,
    #[serde(rename = "transport-destination-port", alias = "tp_dst")]
    DstPort,
    #[serde(rename = "transport-protocol", alias = "nw_proto")]
    Protocol,
    #[serde(rename = "transport-source-port", alias = "tp_src")]
    SrcPort,
}

/// Semantic type a field's raw text is parsed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Port,
    Protocol,
    EtherType,
    Mac,
    Network,
}

impl FieldName {
    pub const ALL: [Self; 8] = [
        Self::DstMac,
        Self::EtherType,
        Self::SrcMac,
        Self::DstIp,
        Self::SrcIp,
        Self::DstPort,
        Self::Protocol,
        Self::SrcPort,
    ];

    /// Canonical, protocol-agnostic name used in policy documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DstMac => "link-layer-destination-address",
            Self::EtherType => "link-layer-ethertype",
            Self::SrcMac => "link-layer-source-address",
            Self::DstIp => "network-destination-address",
            Self::SrcIp => "network-source-address",
            Self::DstPort => "transport-destination-port",
            Self::Protocol => "transport-protocol",
            Self::SrcPort => "transport-source-port",
        }
    }

    /// OpenFlow 1.0 match field name.
    pub fn openflow_name(self) -> &'static str {
        match self {
            Self::DstMac => "dl_dst",
            Self::EtherType => "dl_type",
            Self::SrcMac => "dl_src",
            Self::DstIp => "nw_dst",
            Self::SrcIp => "nw_src",
            Self::DstPort => "tp_dst",
            Self::Protocol => "nw_proto",
            Self::SrcPort => "tp_src",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Self::DstPort | Self::SrcPort => FieldKind::Port,
            Self::Protocol => FieldKind::Protocol,
            Self::EtherType => FieldKind::EtherType,
            Self::DstMac | Self::SrcMac => FieldKind::Mac,
            Self::DstIp | Self::SrcIp => FieldKind::Network,
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = PolicyError;

    /// Accepts either the canonical name or the OpenFlow short name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == name || f.openflow_name() == name)
            .ok_or_else(|| PolicyError::UnrecognizedField {
                name: s.to_string(),
            })
    }
}

// ── Policy ──────────────────────────────────────────────────────────

/// One human-authored blocking rule before compilation: raw text per field.
///
/// There are no in-place setters. Expansion goes through [`Policy::with_field`],
/// which returns a modified copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Policy {
    fields: BTreeMap<FieldName, String>,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, used while assembling a policy from a source.
    #[must_use]
    pub fn with(mut self, field: FieldName, value: impl Into<String>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    /// Return a copy of this policy with `field` set to `value`.
    #[must_use]
    pub fn with_field(&self, field: FieldName, value: &str) -> Self {
        self.clone().with(field, value)
    }

    pub fn get(&self, field: FieldName) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FieldName) -> bool {
        self.fields.contains_key(&field)
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &str)> {
        self.fields.iter().map(|(f, v)| (*f, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(FieldName, String)> for Policy {
    fn from_iter<I: IntoIterator<Item = (FieldName, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

// ── Hardware address ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; 6]);

impl FromStr for MacAddr {
    type Err = PolicyError;

    /// Six octets separated by `:` or `-`, each one or two hex digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PolicyError::InvalidMacAddress {
            value: s.to_string(),
        };
        let trimmed = s.trim();
        let sep = if trimmed.contains(':') { ':' } else { '-' };

        let mut octets = [0u8; 6];
        let mut count = 0;
        for part in trimmed.split(sep) {
            if count == 6
                || part.is_empty()
                || part.len() > 2
                || !part.bytes().all(|b| b.is_ascii_hexdigit())
            {
                return Err(invalid());
            }
            octets[count] = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
            count += 1;
        }
        if count != 6 {
            return Err(invalid());
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── IP network ──────────────────────────────────────────────────────

/// Network-layer address with prefix length (IPv4 or IPv6).
///
/// A bare address parses to a host prefix (/32 or /128).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpNetwork {
    V4 { addr: Ipv4Addr, prefix_len: u8 },
    V6 { addr: Ipv6Addr, prefix_len: u8 },
}

impl IpNetwork {
    pub fn addr(&self) -> IpAddr {
        match *self {
            Self::V4 { addr, .. } => IpAddr::V4(addr),
            Self::V6 { addr, .. } => IpAddr::V6(addr),
        }
    }

    pub fn prefix_len(&self) -> u8 {
        match *self {
            Self::V4 { prefix_len, .. } | Self::V6 { prefix_len, .. } => prefix_len,
        }
    }

    /// Returns `true` if the prefix covers exactly one address.
    pub fn is_host(&self) -> bool {
        match *self {
            Self::V4 { prefix_len, .. } => prefix_len == 32,
            Self::V6 { prefix_len, .. } => prefix_len == 128,
        }
    }
}

impl FromStr for IpNetwork {
    type Err = PolicyError;

    /// Parse `addr` or `addr/prefix`. IPv4 is tried first, then IPv6.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| PolicyError::InvalidNetworkAddress {
            value: s.to_string(),
            reason,
        };
        let trimmed = s.trim();
        let (addr_str, prefix) = match trimmed.split_once('/') {
            Some((addr, prefix)) => {
                if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid("invalid prefix length"));
                }
                let len = prefix
                    .parse::<u8>()
                    .map_err(|_| invalid("invalid prefix length"))?;
                (addr, Some(len))
            }
            None => (trimmed, None),
        };

        if let Ok(addr) = addr_str.parse::<Ipv4Addr>() {
            let prefix_len = prefix.unwrap_or(32);
            if prefix_len > 32 {
                return Err(invalid("IPv4 prefix length must be 0-32"));
            }
            return Ok(Self::V4 { addr, prefix_len });
        }
        if let Ok(addr) = addr_str.parse::<Ipv6Addr>() {
            let prefix_len = prefix.unwrap_or(128);
            if prefix_len > 128 {
                return Err(invalid("IPv6 prefix length must be 0-128"));
            }
            return Ok(Self::V6 { addr, prefix_len });
        }
        Err(invalid("not an IPv4 or IPv6 address"))
    }
}

impl fmt::Display for IpNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_host() {
            write!(f, "{}", self.addr())
        } else {
            write!(f, "{}/{}", self.addr(), self.prefix_len())
        }
    }
}

impl Serialize for IpNetwork {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── Parsed values ───────────────────────────────────────────────────

/// A field value after parsing. The variant always agrees with the
/// field's [`FieldKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Port(u16),
    Protocol(u8),
    EtherType(u16),
    Mac(MacAddr),
    Network(IpNetwork),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Port(_) => FieldKind::Port,
            Self::Protocol(_) => FieldKind::Protocol,
            Self::EtherType(_) => FieldKind::EtherType,
            Self::Mac(_) => FieldKind::Mac,
            Self::Network(_) => FieldKind::Network,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Port(p) => write!(f, "{p}"),
            Self::Protocol(p) => write!(f, "{p}"),
            Self::EtherType(t) => write!(f, "{t:#06x}"),
            Self::Mac(m) => write!(f, "{m}"),
            Self::Network(n) => write!(f, "{n}"),
        }
    }
}

// ── Compiled criterion ──────────────────────────────────────────────

/// Fully parsed match criteria for one installable rule.
///
/// An empty criterion matches all traffic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CompiledCriterion {
    fields: BTreeMap<FieldName, FieldValue>,
}

impl CompiledCriterion {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, field: FieldName, value: FieldValue) {
        debug_assert_eq!(field.kind(), value.kind());
        self.fields.insert(field, value);
    }

    pub fn get(&self, field: FieldName) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    pub fn contains(&self, field: FieldName) -> bool {
        self.fields.contains_key(&field)
    }

    /// Iterate entries in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &FieldValue)> {
        self.fields.iter().map(|(f, v)| (*f, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for CompiledCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fields.is_empty() {
            return f.write_str("<any>");
        }
        for (i, (field, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={value}", field.openflow_name())?;
        }
        Ok(())
    }
}

// ── Policy set ──────────────────────────────────────────────────────

/// The ordered policies loaded from one source plus the switch they
/// must be installed on. Replaced wholesale on reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySet {
    enforcement_point: EnforcementPointId,
    policies: Vec<Policy>,
}

impl PolicySet {
    pub fn new(enforcement_point: EnforcementPointId, policies: Vec<Policy>) -> Self {
        Self {
            enforcement_point,
            policies,
        }
    }

    pub fn empty(enforcement_point: EnforcementPointId) -> Self {
        Self::new(enforcement_point, Vec::new())
    }

    pub fn enforcement_point(&self) -> EnforcementPointId {
        self.enforcement_point
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::wire::{IPPROTO_ICMP, IPPROTO_ICMPV6, IPPROTO_TCP, IPPROTO_UDP};

// ── Enforcement point ───────────────────────────────────────────────

/// Datapath identifier of the switch where compiled rules are installed.
///
/// Displayed as six dash-separated hex octets (`00-00-00-00-00-01`), the
/// lower 48 bits of the id. When the upper 16 bits are set they are
/// appended as `|<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnforcementPointId(pub u64);

impl EnforcementPointId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EnforcementPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        write!(
            f,
            "{:02x}-{:02x}-{:02x}-{:02x}-{:02x}-{:02x}",
            bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7]
        )?;
        let upper = self.0 >> 48;
        if upper != 0 {
            write!(f, "|{upper}")?;
        }
        Ok(())
    }
}

impl FromStr for EnforcementPointId {
    type Err = String;

    /// Accepts a decimal integer or the dash-separated hex form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let is_decimal = |t: &str| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit());
        if is_decimal(s)
            && let Ok(n) = s.parse::<u64>()
        {
            return Ok(Self(n));
        }

        let (octets, upper) = match s.split_once('|') {
            Some((octets, upper)) => {
                if !is_decimal(upper) {
                    return Err(format!("invalid datapath id '{s}': bad upper bits"));
                }
                let upper = upper
                    .parse::<u16>()
                    .map_err(|_| format!("invalid datapath id '{s}': bad upper bits"))?;
                (octets, u64::from(upper))
            }
            None => (s, 0),
        };

        let parts: Vec<&str> = octets.split(['-', ':']).collect();
        if parts.len() != 6 {
            return Err(format!(
                "invalid datapath id '{s}': expected 6 octets, got {}",
                parts.len()
            ));
        }
        let mut value = upper << 48;
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(format!("invalid datapath id '{s}': bad octet '{part}'"));
            }
            let octet = u8::from_str_radix(part, 16)
                .map_err(|_| format!("invalid datapath id '{s}': bad octet '{part}'"))?;
            value |= u64::from(octet) << (8 * (5 - i));
        }
        Ok(Self(value))
    }
}

impl Serialize for EnforcementPointId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for EnforcementPointId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

// ── Transport protocol ──────────────────────────────────────────────

/// IP protocol number as seen on the wire, with the ones the firewall
/// knows by name broken out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportProtocol {
    Tcp,
    Udp,
    Icmp,
    Icmpv6,
    Other(u8),
}

impl TransportProtocol {
    /// Convert to the IP protocol number.
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Tcp => IPPROTO_TCP,
            Self::Udp => IPPROTO_UDP,
            Self::Icmp => IPPROTO_ICMP,
            Self::Icmpv6 => IPPROTO_ICMPV6,
            Self::Other(n) => n,
        }
    }

    /// Create from a raw protocol number.
    pub fn from_u8(n: u8) -> Self {
        match n {
            IPPROTO_TCP => Self::Tcp,
            IPPROTO_UDP => Self::Udp,
            IPPROTO_ICMP => Self::Icmp,
            IPPROTO_ICMPV6 => Self::Icmpv6,
            other => Self::Other(other),
        }
    }

    /// Returns `true` for protocols that carry source/destination ports.
    pub fn has_ports(self) -> bool {
        matches!(self, Self::Tcp | Self::Udp)
    }
}

use crate::common::wire::{
    ETH_P_IP, ETH_P_IPV6, IPPROTO_ICMP, IPPROTO_ICMPV6, IPPROTO_TCP, IPPROTO_UDP,
};

/// Ordered, immutable mapping from a human-readable name to its wire code.
///
/// Iteration order is insertion order and is what drives variant
/// expansion, so it must never depend on hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationTable<C> {
    entries: Vec<(String, C)>,
}

impl<C: Copy + PartialEq> EnumerationTable<C> {
    /// Build a table from `(name, code)` pairs. Names are stored lowercase;
    /// a repeated name keeps its first position and code.
    pub fn from_entries<N: AsRef<str>>(entries: impl IntoIterator<Item = (N, C)>) -> Self {
        let mut table: Vec<(String, C)> = Vec::new();
        for (name, code) in entries {
            let name = name.as_ref().to_ascii_lowercase();
            if !table.iter().any(|(n, _)| *n == name) {
                table.push((name, code));
            }
        }
        Self { entries: table }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<C> {
        let name = name.trim();
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, code)| *code)
    }

    /// Names in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> + Clone {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The two tables a policy's omitted fields are expanded over.
///
/// Built once at startup and shared (`Arc`) between the compiler and
/// anything else that needs to parse field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationTables {
    pub protocols: EnumerationTable<u8>,
    pub ether_types: EnumerationTable<u16>,
}

impl EnumerationTables {
    pub fn new(protocols: EnumerationTable<u8>, ether_types: EnumerationTable<u16>) -> Self {
        Self {
            protocols,
            ether_types,
        }
    }

    /// `tcp, udp, icmp, icmpv6` and `ipv4, ipv6`, in that order.
    pub fn standard() -> Self {
        Self::new(
            EnumerationTable::from_entries([
                ("tcp", IPPROTO_TCP),
                ("udp", IPPROTO_UDP),
                ("icmp", IPPROTO_ICMP),
                ("icmpv6", IPPROTO_ICMPV6),
            ]),
            EnumerationTable::from_entries([("ipv4", ETH_P_IP), ("ipv6", ETH_P_IPV6)]),
        )
    }
}

impl Default for EnumerationTables {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_protocol_order_and_codes() {
        let tables = EnumerationTables::standard();
        let names: Vec<&str> = tables.protocols.names().collect();
        assert_eq!(names, vec!["tcp", "udp", "icmp", "icmpv6"]);
        assert_eq!(tables.protocols.get("tcp"), Some(6));
        assert_eq!(tables.protocols.get("udp"), Some(17));
        assert_eq!(tables.protocols.get("icmp"), Some(1));
        assert_eq!(tables.protocols.get("icmpv6"), Some(58));
    }

    #[test]
    fn standard_ether_type_order_and_codes() {
        let tables = EnumerationTables::standard();
        let names: Vec<&str> = tables.ether_types.names().collect();
        assert_eq!(names, vec!["ipv4", "ipv6"]);
        assert_eq!(tables.ether_types.get("ipv4"), Some(0x0800));
        assert_eq!(tables.ether_types.get("ipv6"), Some(0x86DD));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let tables = EnumerationTables::standard();
        assert_eq!(tables.protocols.get("TCP"), Some(6));
        assert_eq!(tables.ether_types.get(" IPv6 "), Some(0x86DD));
    }

    #[test]
    fn unknown_name_is_none() {
        let tables = EnumerationTables::standard();
        assert_eq!(tables.protocols.get("sctp"), None);
        assert_eq!(tables.ether_types.get("arp"), None);
    }

    #[test]
    fn duplicate_names_keep_first() {
        let table = EnumerationTable::from_entries([("a", 1u8), ("b", 2), ("A", 3)]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a"), Some(1));
    }

    #[test]
    fn default_is_standard() {
        assert_eq!(EnumerationTables::default(), EnumerationTables::standard());
    }
}

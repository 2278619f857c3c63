use super::entity::{FieldKind, FieldName, FieldValue, IpNetwork, MacAddr};
use super::enumeration::EnumerationTables;
use super::error::PolicyError;

/// Parse a policy field's raw text into its semantic value.
///
/// Returns `None` on any parse failure; the caller drops the field.
pub fn parse_field(field: FieldName, raw: &str, tables: &EnumerationTables) -> Option<FieldValue> {
    try_parse_field(field, raw, tables).ok()
}

/// Like [`parse_field`], but reports why a value was rejected.
pub fn try_parse_field(
    field: FieldName,
    raw: &str,
    tables: &EnumerationTables,
) -> Result<FieldValue, PolicyError> {
    match field.kind() {
        FieldKind::Port => parse_port(raw).map(FieldValue::Port),
        FieldKind::Protocol => tables
            .protocols
            .get(raw)
            .map(FieldValue::Protocol)
            .ok_or_else(|| PolicyError::UnknownProtocol {
                value: raw.to_string(),
            }),
        FieldKind::EtherType => tables
            .ether_types
            .get(raw)
            .map(FieldValue::EtherType)
            .ok_or_else(|| PolicyError::UnknownEtherType {
                value: raw.to_string(),
            }),
        FieldKind::Mac => raw.parse::<MacAddr>().map(FieldValue::Mac),
        FieldKind::Network => raw.parse::<IpNetwork>().map(FieldValue::Network),
    }
}

/// Decimal port number in `0..=65535`.
pub fn parse_port(raw: &str) -> Result<u16, PolicyError> {
    let invalid = || PolicyError::InvalidPort {
        value: raw.to_string(),
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    trimmed.parse::<u16>().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use super::*;

    fn tables() -> EnumerationTables {
        EnumerationTables::standard()
    }

    // ── Ports ─────────────────────────────────────────────────────

    #[test]
    fn port_parses_decimal() {
        assert_eq!(
            parse_field(FieldName::DstPort, "80", &tables()),
            Some(FieldValue::Port(80))
        );
        assert_eq!(
            parse_field(FieldName::SrcPort, " 5001 ", &tables()),
            Some(FieldValue::Port(5001))
        );
    }

    #[test]
    fn non_numeric_port_is_absent() {
        assert_eq!(
            parse_field(FieldName::DstPort, "not-a-number", &tables()),
            None
        );
    }

    #[test]
    fn signed_port_is_absent() {
        assert_eq!(parse_field(FieldName::DstPort, "+80", &tables()), None);
        assert_eq!(parse_field(FieldName::SrcPort, "", &tables()), None);
    }

    #[test]
    fn signed_mac_and_prefix_are_absent() {
        assert_eq!(
            parse_field(FieldName::DstMac, "+0:+0:+0:+0:+0:+2", &tables()),
            None
        );
        assert_eq!(parse_field(FieldName::DstIp, "10.0.0.0/+8", &tables()), None);
    }

    #[test]
    fn out_of_range_port_is_absent() {
        assert_eq!(parse_field(FieldName::DstPort, "65536", &tables()), None);
        assert_eq!(parse_field(FieldName::DstPort, "-1", &tables()), None);
        assert_eq!(
            parse_field(FieldName::DstPort, "65535", &tables()),
            Some(FieldValue::Port(65535))
        );
    }

    #[test]
    fn port_error_names_value() {
        assert_eq!(
            try_parse_field(FieldName::DstPort, "http", &tables()),
            Err(PolicyError::InvalidPort {
                value: "http".to_string()
            })
        );
    }

    // ── Enumerated fields ─────────────────────────────────────────

    #[test]
    fn protocol_lookup() {
        assert_eq!(
            parse_field(FieldName::Protocol, "udp", &tables()),
            Some(FieldValue::Protocol(17))
        );
        assert_eq!(
            try_parse_field(FieldName::Protocol, "sctp", &tables()),
            Err(PolicyError::UnknownProtocol {
                value: "sctp".to_string()
            })
        );
    }

    #[test]
    fn ether_type_lookup() {
        assert_eq!(
            parse_field(FieldName::EtherType, "ipv6", &tables()),
            Some(FieldValue::EtherType(0x86DD))
        );
        assert!(matches!(
            try_parse_field(FieldName::EtherType, "arp", &tables()),
            Err(PolicyError::UnknownEtherType { .. })
        ));
    }

    #[test]
    fn protocol_name_is_not_an_ether_type() {
        assert_eq!(parse_field(FieldName::EtherType, "tcp", &tables()), None);
        assert_eq!(parse_field(FieldName::Protocol, "ipv4", &tables()), None);
    }

    // ── Hardware addresses ────────────────────────────────────────

    #[test]
    fn mac_fields_parse() {
        assert_eq!(
            parse_field(FieldName::DstMac, "00:00:00:00:00:02", &tables()),
            Some(FieldValue::Mac(MacAddr([0, 0, 0, 0, 0, 2])))
        );
        assert_eq!(
            parse_field(FieldName::SrcMac, "aa-bb-cc-dd-ee-ff", &tables()),
            Some(FieldValue::Mac(MacAddr([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff])))
        );
    }

    #[test]
    fn malformed_mac_is_absent() {
        assert_eq!(parse_field(FieldName::SrcMac, "00:00:00", &tables()), None);
    }

    // ── Network addresses ─────────────────────────────────────────

    #[test]
    fn network_fields_detect_family() {
        assert_eq!(
            parse_field(FieldName::SrcIp, "10.0.0.1", &tables()),
            Some(FieldValue::Network(IpNetwork::V4 {
                addr: Ipv4Addr::new(10, 0, 0, 1),
                prefix_len: 32
            }))
        );
        assert_eq!(
            parse_field(FieldName::DstIp, "fe80::1", &tables()),
            Some(FieldValue::Network(IpNetwork::V6 {
                addr: Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1),
                prefix_len: 128
            }))
        );
    }

    #[test]
    fn malformed_address_is_absent_not_misclassified() {
        // Has a '.', but is neither IPv4 nor IPv6.
        assert_eq!(parse_field(FieldName::DstIp, "10.0.0.256", &tables()), None);
        // No '.', and not IPv6 either.
        assert_eq!(parse_field(FieldName::DstIp, "localhost", &tables()), None);
    }

    // ── Type agreement ────────────────────────────────────────────

    #[test]
    fn parsed_kind_always_matches_field_kind() {
        let samples = [
            (FieldName::DstPort, "22"),
            (FieldName::SrcPort, "1024"),
            (FieldName::Protocol, "icmp"),
            (FieldName::EtherType, "ipv4"),
            (FieldName::SrcMac, "00:00:00:00:00:01"),
            (FieldName::DstMac, "00:00:00:00:00:03"),
            (FieldName::SrcIp, "2001:db8::1"),
            (FieldName::DstIp, "10.0.0.0/8"),
        ];
        for (field, raw) in samples {
            let value = parse_field(field, raw, &tables()).unwrap();
            assert_eq!(value.kind(), field.kind(), "{field}");
        }
    }
}

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::common::entity::TransportProtocol;
use crate::common::wire::{
    ETH_HDR_LEN, ETH_P_8021AD, ETH_P_8021Q, ETH_P_IP, ETH_P_IPV6, IPPROTO_DSTOPTS,
    IPPROTO_FRAGMENT, IPPROTO_HOPOPTS, IPPROTO_ROUTING, IPPROTO_TCP, IPPROTO_UDP,
    IPV4_MIN_HDR_LEN, IPV6_FRAGMENT_HDR_LEN, IPV6_HDR_LEN, TCP_MIN_HDR_LEN, UDP_HDR_LEN,
    VLAN_TAG_LEN,
};

use super::entity::{Endpoint, FlowTuple};
use super::error::FlowError;

// ── Constants ───────────────────────────────────────────────────────

/// Stacked VLAN tags we skip (802.1ad outer + 802.1Q inner).
const MAX_VLAN_TAGS: usize = 2;
/// IPv6 extension headers followed before giving up on the transport header.
const MAX_IPV6_EXT_HEADERS: usize = 8;

// ── Public API ──────────────────────────────────────────────────────

/// Classify a raw Ethernet II frame into a protocol/address/port tuple.
///
/// IPv4 vs IPv6 is decided by the frame's ethertype. Ports are filled in
/// for TCP and UDP when the transport header is present; when it is not
/// (truncated capture, non-first fragment) the protocol is reported as
/// `Other(n)` so it is logged by number.
pub fn classify(frame: &[u8]) -> Result<FlowTuple, FlowError> {
    let l2 = parse_ethernet(frame)?;
    let l3 = &frame[l2.payload_offset..];

    let header = match l2.ether_type {
        ETH_P_IP => parse_ipv4(l3)?,
        ETH_P_IPV6 => parse_ipv6(l3)?,
        other => return Err(FlowError::NotIp { ether_type: other }),
    };

    let ports = header
        .transport_offset
        .and_then(|offset| transport_ports(header.protocol, &l3[offset..]));

    let protocol = match (TransportProtocol::from_u8(header.protocol), ports) {
        (proto, None) if proto.has_ports() => TransportProtocol::Other(header.protocol),
        (proto, _) => proto,
    };

    Ok(FlowTuple {
        protocol,
        src: Endpoint {
            addr: header.src,
            port: ports.map(|(src, _)| src),
        },
        dst: Endpoint {
            addr: header.dst,
            port: ports.map(|(_, dst)| dst),
        },
        vlan_id: l2.vlan_id,
    })
}

// ── Link layer ──────────────────────────────────────────────────────

struct LinkHeader {
    ether_type: u16,
    vlan_id: Option<u16>,
    payload_offset: usize,
}

fn parse_ethernet(frame: &[u8]) -> Result<LinkHeader, FlowError> {
    ensure_len(frame, ETH_HDR_LEN, "ethernet")?;

    let mut ether_type = read_u16(frame, 12);
    let mut offset = ETH_HDR_LEN;
    let mut vlan_id = None;

    for _ in 0..MAX_VLAN_TAGS {
        if ether_type != ETH_P_8021Q && ether_type != ETH_P_8021AD {
            break;
        }
        ensure_len(frame, offset + VLAN_TAG_LEN, "vlan")?;
        vlan_id = Some(read_u16(frame, offset) & 0x0FFF);
        ether_type = read_u16(frame, offset + 2);
        offset += VLAN_TAG_LEN;
    }

    Ok(LinkHeader {
        ether_type,
        vlan_id,
        payload_offset: offset,
    })
}

// ── Network layer ───────────────────────────────────────────────────

struct NetworkHeader {
    protocol: u8,
    src: IpAddr,
    dst: IpAddr,
    /// Offset of the transport header within the L3 slice, if one follows.
    transport_offset: Option<usize>,
}

fn parse_ipv4(packet: &[u8]) -> Result<NetworkHeader, FlowError> {
    ensure_len(packet, IPV4_MIN_HDR_LEN, "ipv4")?;

    if packet[0] >> 4 != 4 {
        return Err(FlowError::Malformed {
            layer: "ipv4",
            reason: "version is not 4",
        });
    }
    let header_len = usize::from(packet[0] & 0x0F) * 4;
    if header_len < IPV4_MIN_HDR_LEN {
        return Err(FlowError::Malformed {
            layer: "ipv4",
            reason: "header length below minimum",
        });
    }
    ensure_len(packet, header_len, "ipv4")?;

    // Non-first fragments carry no transport header.
    let fragment_offset = read_u16(packet, 6) & 0x1FFF;

    Ok(NetworkHeader {
        protocol: packet[9],
        src: IpAddr::V4(Ipv4Addr::new(packet[12], packet[13], packet[14], packet[15])),
        dst: IpAddr::V4(Ipv4Addr::new(packet[16], packet[17], packet[18], packet[19])),
        transport_offset: (fragment_offset == 0).then_some(header_len),
    })
}

fn parse_ipv6(packet: &[u8]) -> Result<NetworkHeader, FlowError> {
    ensure_len(packet, IPV6_HDR_LEN, "ipv6")?;

    if packet[0] >> 4 != 6 {
        return Err(FlowError::Malformed {
            layer: "ipv6",
            reason: "version is not 6",
        });
    }

    let src = IpAddr::V6(Ipv6Addr::from(read_16_bytes(packet, 8)));
    let dst = IpAddr::V6(Ipv6Addr::from(read_16_bytes(packet, 24)));

    let mut next_header = packet[6];
    let mut offset = IPV6_HDR_LEN;
    let mut transport_offset = Some(offset);

    for _ in 0..MAX_IPV6_EXT_HEADERS {
        match next_header {
            IPPROTO_HOPOPTS | IPPROTO_ROUTING | IPPROTO_DSTOPTS => {
                if packet.len() < offset + 2 {
                    transport_offset = None;
                    break;
                }
                let ext_len = (usize::from(packet[offset + 1]) + 1) * 8;
                next_header = packet[offset];
                offset += ext_len;
            }
            IPPROTO_FRAGMENT => {
                if packet.len() < offset + IPV6_FRAGMENT_HDR_LEN {
                    transport_offset = None;
                    break;
                }
                let fragment_offset = read_u16(packet, offset + 2) >> 3;
                next_header = packet[offset];
                offset += IPV6_FRAGMENT_HDR_LEN;
                if fragment_offset != 0 {
                    transport_offset = None;
                    break;
                }
            }
            _ => {
                transport_offset = Some(offset);
                break;
            }
        }
    }

    // Ran out of budget while still inside the extension chain.
    if matches!(
        next_header,
        IPPROTO_HOPOPTS | IPPROTO_ROUTING | IPPROTO_DSTOPTS | IPPROTO_FRAGMENT
    ) {
        transport_offset = None;
    }

    Ok(NetworkHeader {
        protocol: next_header,
        src,
        dst,
        transport_offset: transport_offset.filter(|&o| o <= packet.len()),
    })
}

// ── Transport layer ─────────────────────────────────────────────────

/// Source and destination ports, if the protocol has them and the
/// header is complete.
fn transport_ports(protocol: u8, segment: &[u8]) -> Option<(u16, u16)> {
    let min_len = match protocol {
        IPPROTO_TCP => TCP_MIN_HDR_LEN,
        IPPROTO_UDP => UDP_HDR_LEN,
        _ => return None,
    };
    if segment.len() < min_len {
        return None;
    }
    Some((read_u16(segment, 0), read_u16(segment, 2)))
}

// ── Byte helpers ────────────────────────────────────────────────────

fn ensure_len(buf: &[u8], need: usize, layer: &'static str) -> Result<(), FlowError> {
    if buf.len() < need {
        return Err(FlowError::Truncated {
            layer,
            need,
            got: buf.len(),
        });
    }
    Ok(())
}

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

fn read_16_bytes(buf: &[u8], offset: usize) -> [u8; 16] {
    let mut out = [0u8; 16];
    out.copy_from_slice(&buf[offset..offset + 16]);
    out
}

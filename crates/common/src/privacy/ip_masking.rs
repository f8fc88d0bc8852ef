//! IP address anonymization.
//!
//! The fixed-width strategies work on the textual form and never parse the
//! address. Subnet masking parses it, keeps the leading bits and renders the
//! result in canonical form. Every function returns an empty string for input
//! it cannot handle.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::account::{IPV4_BITS, IPV6_BITS};

/// Replaces the last IPv4 octet with `0`.
#[must_use]
pub fn scrub_ipv4_lowest8(ip: &str) -> String {
    match ip.rfind('.') {
        Some(i) => format!("{}.0", &ip[..i]),
        None => String::new(),
    }
}

/// Replaces the last IPv6 group with `0`.
#[must_use]
pub fn scrub_ipv6_lowest16(ip: &str) -> String {
    match ip.rfind(':') {
        Some(i) => format!("{}:0", &ip[..i]),
        None => String::new(),
    }
}

/// Replaces the last two IPv6 groups with `0:0`.
#[must_use]
pub fn scrub_ipv6_lowest32(ip: &str) -> String {
    let Some(last) = ip.rfind(':') else {
        return String::new();
    };
    match ip[..last].rfind(':') {
        Some(i) => format!("{}:0:0", &ip[..i]),
        None => String::new(),
    }
}

/// Keeps the leading `keep_bits` of an address of width `bits`.
///
/// `bits` selects the family (32 for IPv4, 128 for IPv6). Input of the other
/// family or that fails to parse yields an empty string.
#[must_use]
pub fn scrub_ip(ip: &str, keep_bits: u32, bits: u32) -> String {
    let Ok(addr) = ip.parse::<IpAddr>() else {
        return String::new();
    };

    match (addr, bits) {
        (IpAddr::V4(v4), IPV4_BITS) => {
            let mask = prefix_mask_u32(keep_bits.min(IPV4_BITS));
            Ipv4Addr::from(u32::from(v4) & mask).to_string()
        }
        (IpAddr::V6(v6), IPV6_BITS) => {
            let mask = prefix_mask_u128(keep_bits.min(IPV6_BITS));
            Ipv6Addr::from(u128::from(v6) & mask).to_string()
        }
        _ => String::new(),
    }
}

fn prefix_mask_u32(keep_bits: u32) -> u32 {
    u32::MAX.checked_shl(IPV4_BITS - keep_bits).unwrap_or(0)
}

fn prefix_mask_u128(keep_bits: u32) -> u128 {
    u128::MAX.checked_shl(IPV6_BITS - keep_bits).unwrap_or(0)
}

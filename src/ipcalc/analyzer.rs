/// CIDR Analyzer
///
/// Derives the network view (`info`) and the mask view (`netmask_info`) of a
/// parsed `CidrAddress`. Both are pure functions of their input and cannot
/// fail once the address has been parsed.

use serde::Serialize;
use std::net::Ipv4Addr;

use super::cidr::{self, CidrAddress, MAX_PREFIX_LEN, Octets};

/// Result of the `info` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    /// Address as supplied by the caller.
    pub address: Ipv4Addr,
    /// `address AND mask`.
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub prefix_len: u8,
    pub hosts: HostSpan,
}

/// What a network holds besides its network address.
///
/// A /32 is a host route: one address, no broadcast, no usable range.
/// Every shorter prefix is a subnet with a broadcast address and a
/// (possibly empty) usable host range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HostSpan {
    HostRoute,
    Subnet {
        broadcast: Ipv4Addr,
        #[serde(rename = "usableHosts")]
        usable_hosts: u64,
    },
}

impl NetworkInfo {
    pub fn broadcast(&self) -> Option<Ipv4Addr> {
        match self.hosts {
            HostSpan::HostRoute => None,
            HostSpan::Subnet { broadcast, .. } => Some(broadcast),
        }
    }

    /// Usable hosts for a subnet, or the single address of a host route.
    pub fn host_count(&self) -> u64 {
        match self.hosts {
            HostSpan::HostRoute => 1,
            HostSpan::Subnet { usable_hosts, .. } => usable_hosts,
        }
    }
}

/// Result of the `netmask` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetmaskInfo {
    /// Network address the mask applies to.
    pub address: Ipv4Addr,
    pub prefix_len: u8,
    pub netmask: Octets,
    /// Mask bits in four dot-separated groups of eight.
    pub binary: String,
    /// `255 - octet` for every mask octet.
    pub wildcard: Octets,
    /// Eight uppercase hex digits, no `0x`.
    pub hex: String,
}

/// Usable hosts in a subnet of the given prefix: `2^(32 - prefix) - 2`, never negative.
pub fn usable_hosts(prefix_len: u8) -> u64 {
    let host_bits = MAX_PREFIX_LEN.saturating_sub(prefix_len);
    (1u64 << host_bits).saturating_sub(2)
}

pub fn info(cidr: &CidrAddress) -> NetworkInfo {
    let mask = cidr.mask();
    let network = cidr::and(cidr.address().octets(), mask);

    let hosts = if cidr.is_host_route() {
        HostSpan::HostRoute
    } else {
        HostSpan::Subnet {
            broadcast: Ipv4Addr::from(cidr::or(network, cidr::complement(mask))),
            usable_hosts: usable_hosts(cidr.prefix_len()),
        }
    };

    NetworkInfo {
        address: cidr.address(),
        network: Ipv4Addr::from(network),
        netmask: Ipv4Addr::from(mask),
        prefix_len: cidr.prefix_len(),
        hosts,
    }
}

pub fn netmask_info(cidr: &CidrAddress) -> NetmaskInfo {
    let mask = cidr.mask();

    NetmaskInfo {
        address: cidr.network(),
        prefix_len: cidr.prefix_len(),
        netmask: mask,
        binary: binary_mask(cidr.prefix_len()),
        wildcard: cidr::complement(mask),
        hex: mask.iter().map(|b| format!("{:02X}", b)).collect(),
    }
}

// Groups always break at octet boundaries, so /20 gives "...11110000...".
fn binary_mask(prefix_len: u8) -> String {
    (0..4u8)
        .map(|octet| {
            (0..8u8)
                .map(|bit| if octet * 8 + bit < prefix_len { '1' } else { '0' })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info_of(input: &str) -> NetworkInfo {
        info(&CidrAddress::parse(input).unwrap())
    }

    fn netmask_of(input: &str) -> NetmaskInfo {
        netmask_info(&CidrAddress::parse(input).unwrap())
    }

    #[test]
    fn class_c_network() {
        let info = info_of("192.168.1.0/24");
        assert_eq!(info.network, Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(info.netmask, Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(info.broadcast(), Some(Ipv4Addr::new(192, 168, 1, 255)));
        assert_eq!(info.host_count(), 254);
        assert_eq!(info.prefix_len, 24);
    }

    #[test]
    fn point_to_point_network() {
        let info = info_of("10.0.0.0/30");
        assert_eq!(info.netmask, Ipv4Addr::new(255, 255, 255, 252));
        assert_eq!(info.broadcast(), Some(Ipv4Addr::new(10, 0, 0, 3)));
        assert_eq!(info.host_count(), 2);
    }

    #[test]
    fn host_route_has_no_broadcast() {
        let info = info_of("192.168.1.1/32");
        assert_eq!(info.hosts, HostSpan::HostRoute);
        assert_eq!(info.broadcast(), None);
        assert_eq!(info.host_count(), 1);
        assert_eq!(info.network, Ipv4Addr::new(192, 168, 1, 1));
    }

    #[test]
    fn slash_31_saturates_to_zero_usable_hosts() {
        let info = info_of("10.0.0.1/31");
        assert_eq!(
            info.hosts,
            HostSpan::Subnet {
                broadcast: Ipv4Addr::new(10, 0, 0, 1),
                usable_hosts: 0,
            }
        );
    }

    #[test]
    fn slash_0_covers_everything() {
        let info = info_of("203.0.113.7/0");
        assert_eq!(info.network, Ipv4Addr::UNSPECIFIED);
        assert_eq!(info.broadcast(), Some(Ipv4Addr::BROADCAST));
        assert_eq!(info.host_count(), 4_294_967_294);
    }

    #[test]
    fn keeps_original_address_apart_from_network() {
        let info = info_of("172.16.5.77/20");
        assert_eq!(info.address, Ipv4Addr::new(172, 16, 5, 77));
        assert_eq!(info.network, Ipv4Addr::new(172, 16, 0, 0));
        assert_eq!(info.broadcast(), Some(Ipv4Addr::new(172, 16, 15, 255)));
    }

    #[test]
    fn network_and_broadcast_are_bytewise_for_every_prefix() {
        let address = Ipv4Addr::new(198, 51, 100, 213);
        for prefix_len in 0..=MAX_PREFIX_LEN {
            let cidr = CidrAddress::new(address, prefix_len).unwrap();
            let info = info(&cidr);
            let mask = cidr.mask();
            let expected_network: Octets =
                std::array::from_fn(|i| address.octets()[i] & mask[i]);
            assert_eq!(info.network.octets(), expected_network);

            if prefix_len < MAX_PREFIX_LEN {
                let expected_broadcast: Octets =
                    std::array::from_fn(|i| expected_network[i] | (0xFF ^ mask[i]));
                assert_eq!(info.broadcast().unwrap().octets(), expected_broadcast);
                let expected_hosts = (2u64.pow(u32::from(32 - prefix_len))).saturating_sub(2);
                assert_eq!(info.host_count(), expected_hosts);
            } else {
                assert_eq!(info.broadcast(), None);
                assert_eq!(info.host_count(), 1);
            }
        }
    }

    #[test]
    fn class_b_netmask() {
        let netmask = netmask_of("172.16.0.0/16");
        assert_eq!(netmask.netmask, [255, 255, 0, 0]);
        assert_eq!(netmask.wildcard, [0, 0, 255, 255]);
        assert_eq!(netmask.hex, "FFFF0000");
        assert_eq!(netmask.binary, "11111111.11111111.00000000.00000000");
    }

    #[test]
    fn custom_netmask() {
        let netmask = netmask_of("10.0.0.0/27");
        assert_eq!(netmask.netmask, [255, 255, 255, 224]);
        assert_eq!(netmask.wildcard, [0, 0, 0, 31]);
        assert_eq!(netmask.hex, "FFFFFFE0");
    }

    #[test]
    fn binary_splits_mid_octet() {
        let netmask = netmask_of("10.0.0.0/20");
        assert_eq!(netmask.binary, "11111111.11111111.11110000.00000000");
        assert_eq!(netmask.wildcard, [0, 0, 15, 255]);
    }

    #[test]
    fn netmask_reports_network_address() {
        let netmask = netmask_of("192.168.1.77/24");
        assert_eq!(netmask.address, Ipv4Addr::new(192, 168, 1, 0));
    }

    #[test]
    fn netmask_properties_hold_for_every_prefix() {
        for prefix_len in 0..=MAX_PREFIX_LEN {
            let cidr = CidrAddress::new(Ipv4Addr::new(10, 20, 30, 40), prefix_len).unwrap();
            let netmask = netmask_info(&cidr);

            let bits: String = netmask.binary.split('.').collect();
            assert_eq!(netmask.binary.split('.').count(), 4);
            assert!(netmask.binary.split('.').all(|group| group.len() == 8));
            assert_eq!(bits.len(), 32);
            assert_eq!(bits.matches('1').count(), usize::from(prefix_len));

            for i in 0..4 {
                assert_eq!(u16::from(netmask.wildcard[i]) + u16::from(netmask.netmask[i]), 255);
            }

            assert_eq!(netmask.hex.len(), 8);
            assert!(netmask.hex.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
            let decoded = u32::from_str_radix(&netmask.hex, 16).unwrap().to_be_bytes();
            assert_eq!(decoded, netmask.netmask);
            assert_eq!(cidr::prefix_from_mask(decoded), prefix_len);
        }
    }

    #[test]
    fn serializes_host_span_by_kind() {
        let subnet = serde_json::to_value(info_of("10.0.0.0/30")).unwrap();
        assert_eq!(subnet["hosts"]["kind"], "subnet");
        assert_eq!(subnet["hosts"]["broadcast"], "10.0.0.3");
        assert_eq!(subnet["hosts"]["usableHosts"], 2);
        assert_eq!(subnet["prefixLen"], 30);

        let host = serde_json::to_value(info_of("10.0.0.1/32")).unwrap();
        assert_eq!(host["hosts"], serde_json::json!({ "kind": "hostRoute" }));
    }
}

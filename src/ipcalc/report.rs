/// Plain-text reports in the style of the Linux `ipcalc` utility.

use std::fmt;
use std::net::Ipv4Addr;

use super::analyzer::{HostSpan, NetmaskInfo, NetworkInfo};
use super::cidr::Octets;

fn dotted(octets: Octets) -> Ipv4Addr {
    Ipv4Addr::from(octets)
}

impl fmt::Display for NetworkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IP Address: {}", self.address)?;
        writeln!(f, "Network: {}/{}", self.network, self.prefix_len)?;
        writeln!(f, "Netmask: {}", self.netmask)?;
        match self.hosts {
            HostSpan::HostRoute => {
                writeln!(f, "Prefix: /{}", self.prefix_len)?;
                writeln!(f, "Hosts/Net: 1")
            }
            HostSpan::Subnet {
                broadcast,
                usable_hosts,
            } => {
                writeln!(f, "Broadcast: {}", broadcast)?;
                writeln!(f, "Prefix: /{}", self.prefix_len)?;
                writeln!(f, "Usable Hosts: {}", usable_hosts)
            }
        }
    }
}

impl fmt::Display for NetmaskInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Address: {}", self.address)?;
        writeln!(f, "Netmask: {} = {}", dotted(self.netmask), self.binary)?;
        writeln!(f, "Wildcard: {}", dotted(self.wildcard))?;
        writeln!(f, "Hex netmask: 0x{}", self.hex)?;
        writeln!(f, "Prefix: /{}", self.prefix_len)
    }
}

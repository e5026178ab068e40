/// CIDR Parsing and Mask Arithmetic
///
/// A `CidrAddress` is the validated form of a `"<dotted-quad>/<prefix>"`
/// string. All arithmetic works on immutable `[u8; 4]` octet arrays and
/// returns new arrays; nothing is modified in place.

use serde::{Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use super::error::IpcalcError;

/// Four network-order bytes of an IPv4 address or mask.
pub type Octets = [u8; 4];

/// Number of bits in an IPv4 address, and therefore the longest valid prefix.
pub const MAX_PREFIX_LEN: u8 = 32;

/// Build the canonical mask for a prefix: `prefix_len` one-bits followed by zeros.
///
/// Prefixes above 32 are clamped to 32.
pub fn mask_from_prefix(prefix_len: u8) -> Octets {
    let host_bits = u32::from(MAX_PREFIX_LEN.saturating_sub(prefix_len));
    // shifting a u32 by 32 overflows, which is the /0 case
    let bits = u32::MAX.checked_shl(host_bits).unwrap_or(0);
    bits.to_be_bytes()
}

/// Read the prefix length back out of a canonical mask.
pub fn prefix_from_mask(mask: Octets) -> u8 {
    u32::from_be_bytes(mask).leading_ones() as u8
}

/// Byte-wise AND.
pub fn and(lhs: Octets, rhs: Octets) -> Octets {
    std::array::from_fn(|i| lhs[i] & rhs[i])
}

/// Byte-wise OR.
pub fn or(lhs: Octets, rhs: Octets) -> Octets {
    std::array::from_fn(|i| lhs[i] | rhs[i])
}

/// Byte-wise complement.
pub fn complement(octets: Octets) -> Octets {
    octets.map(|b| !b)
}

/// A parsed IPv4 address together with its network prefix.
///
/// Invariant: `prefix_len <= 32` and `mask == mask_from_prefix(prefix_len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CidrAddress {
    address: Ipv4Addr,
    prefix_len: u8,
    mask: Octets,
}

impl CidrAddress {
    pub fn new(address: Ipv4Addr, prefix_len: u8) -> Result<Self, IpcalcError> {
        if prefix_len > MAX_PREFIX_LEN {
            return Err(IpcalcError::malformed(&format!("{}/{}", address, prefix_len)));
        }
        Ok(Self {
            address,
            prefix_len,
            mask: mask_from_prefix(prefix_len),
        })
    }

    /// Parse `"<dotted-quad>/<prefix>"`.
    ///
    /// Rejects a missing slash, anything that is not an IPv4 dotted quad
    /// (IPv6 included), a prefix with non-digit characters, a prefix above
    /// 32, and trailing input.
    pub fn parse(input: &str) -> Result<Self, IpcalcError> {
        let malformed = || IpcalcError::malformed(input);

        let (addr, prefix) = input.split_once('/').ok_or_else(malformed)?;
        let address: Ipv4Addr = addr.parse().map_err(|_| malformed())?;

        // u8::from_str accepts a leading '+', CIDR notation does not
        if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let prefix_len: u8 = prefix.parse().map_err(|_| malformed())?;
        if prefix_len > MAX_PREFIX_LEN {
            return Err(malformed());
        }

        Self::new(address, prefix_len)
    }

    /// The address exactly as it was given, host bits included.
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn mask(&self) -> Octets {
        self.mask
    }

    /// `address AND mask`.
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(and(self.address.octets(), self.mask))
    }

    /// A /32 names exactly one address and has no broadcast.
    pub fn is_host_route(&self) -> bool {
        self.prefix_len == MAX_PREFIX_LEN
    }
}

impl FromStr for CidrAddress {
    type Err = IpcalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CidrAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl Serialize for CidrAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

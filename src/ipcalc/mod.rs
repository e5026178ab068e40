/// IPv4 Calculator Module
///
/// The calculator behind the `ipcalc` tool:
/// - cidr.rs: CIDR parsing and byte-wise mask arithmetic
/// - analyzer.rs: network and netmask views of a parsed address
/// - report.rs: plain-text rendering of both views
/// - error.rs: error taxonomy
///
/// Everything here is synchronous and stateless; callers may run it from any
/// number of threads at once.

pub mod analyzer;
pub mod cidr;
pub mod error;
mod report;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub use analyzer::{HostSpan, NetmaskInfo, NetworkInfo, info, netmask_info};
pub use cidr::{CidrAddress, Octets};
pub use error::IpcalcError;

/// Operation tags accepted by `analyze`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Info,
    Netmask,
    /// Subnet enumeration. Part of the tool surface but not implemented.
    Split,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Info => "info",
            Operation::Netmask => "netmask",
            Operation::Split => "split",
        }
    }

    /// Operations that produce a result.
    pub const SUPPORTED: [Operation; 2] = [Operation::Info, Operation::Netmask];
}

impl FromStr for Operation {
    type Err = IpcalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Operation::Info),
            "netmask" => Ok(Operation::Netmask),
            "split" => Ok(Operation::Split),
            other => Err(IpcalcError::UnknownOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured result of one calculator call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum Analysis {
    Info(NetworkInfo),
    Netmask(NetmaskInfo),
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Analysis::Info(info) => fmt::Display::fmt(info, f),
            Analysis::Netmask(netmask) => fmt::Display::fmt(netmask, f),
        }
    }
}

/// Parse `cidr` and run `operation` on it.
///
/// The CIDR string is validated before the operation tag, so a malformed
/// address is reported even when the operation is unknown.
pub fn analyze(operation: &str, cidr: &str) -> Result<Analysis, IpcalcError> {
    let cidr = CidrAddress::parse(cidr)?;

    match operation.parse::<Operation>()? {
        Operation::Info => Ok(Analysis::Info(info(&cidr))),
        Operation::Netmask => Ok(Analysis::Netmask(netmask_info(&cidr))),
        Operation::Split => Err(IpcalcError::UnsupportedOperation(
            Operation::Split.to_string(),
        )),
    }
}

/// Calculator Error Types
///
/// Every failure the calculator can report. None of them are transient:
/// the same input always produces the same error.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IpcalcError {
    /// The input is not `<dotted-quad>/<prefix>` or the prefix is outside 0..=32.
    #[error("Invalid IP address format. Please use CIDR notation (e.g., 192.168.1.0/24)")]
    MalformedCidr { input: String },

    /// The operation tag is not one the calculator knows about.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// The operation tag is recognised but has no implementation.
    #[error("Operation '{0}' is not supported")]
    UnsupportedOperation(String),
}

impl IpcalcError {
    pub(crate) fn malformed(input: &str) -> Self {
        Self::MalformedCidr {
            input: input.to_string(),
        }
    }
}

/// IP Calculator Tool
///
/// Exposes the IPv4 calculator as the `ipcalc` MCP tool. Arguments are
/// deserialized into `IpcalcArgs` before anything else happens, so the
/// calculator only ever sees typed input.

use crate::core::server::{MCPTool, ToolHandler, ToolRegistry};
use crate::ipcalc::{self, Analysis, IpcalcError, Operation};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub const TOOL_NAME: &str = "ipcalc";

/// Failures of one `ipcalc` tool call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// Arguments did not match the input schema.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Ipcalc(#[from] IpcalcError),
}

/// Arguments accepted by the `ipcalc` tool.
#[derive(Debug, Deserialize)]
pub struct IpcalcArgs {
    pub operation: String,
    /// CIDR string. Kept loose so a missing or non-string value is reported
    /// as a CIDR format error rather than a schema error.
    #[serde(default)]
    pub ip: Option<Value>,
    /// New prefix length for subnet splitting. Never read until `split`
    /// exists, so any JSON value is accepted.
    #[serde(default)]
    pub prefix: Option<Value>,
}

impl IpcalcArgs {
    pub fn from_value(args: Value) -> Result<Self, ToolError> {
        serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))
    }

    pub fn run(&self) -> Result<Analysis, ToolError> {
        let ip = self.ip.as_ref().and_then(Value::as_str).unwrap_or_default();
        Ok(ipcalc::analyze(&self.operation, ip)?)
    }
}

fn input_schema() -> Value {
    let operations: Vec<&str> = Operation::SUPPORTED.iter().map(Operation::as_str).collect();

    serde_json::json!({
        "type": "object",
        "properties": {
            "operation": {
                "type": "string",
                "description": "The operation to perform (info, netmask)",
                "enum": operations
            },
            "ip": {
                "type": "string",
                "description": "IP address in CIDR notation (e.g., 192.168.1.0/24)"
            },
            "prefix": {
                "type": "number",
                "description": "New prefix length for subnet splitting (required for 'split' operation)"
            }
        },
        "required": ["operation", "ip"]
    })
}

/// Register the ipcalc tool with the tool registry.
pub fn register(registry: &mut ToolRegistry) {
    let tool = MCPTool {
        name: TOOL_NAME.to_string(),
        description: "Calculate IP address information like ipcalc in Linux".to_string(),
        input_schema: input_schema(),
    };

    let handler: ToolHandler = Box::new(|args: Value| -> Result<Value, String> {
        let result = IpcalcArgs::from_value(args).and_then(|args| {
            debug!(operation = %args.operation, "ipcalc called");
            args.run()
        });

        match result {
            Ok(analysis) => Ok(Value::String(analysis.to_string())),
            Err(e) => {
                warn!(error = %e, "ipcalc failed");
                Err(e.to_string())
            }
        }
    });

    registry.register(tool, handler);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(args: Value) -> Result<Value, String> {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        registry.call(TOOL_NAME, args).expect("ipcalc is registered")
    }

    fn text(args: Value) -> String {
        match run(args).unwrap() {
            Value::String(text) => text,
            other => panic!("expected text, got {}", other),
        }
    }

    #[test]
    fn schema_only_advertises_working_operations() {
        let schema = input_schema();
        assert_eq!(schema["properties"]["operation"]["enum"], json!(["info", "netmask"]));
        assert_eq!(schema["required"], json!(["operation", "ip"]));
    }

    #[test]
    fn info_report() {
        let report = text(json!({ "operation": "info", "ip": "192.168.1.0/24" }));
        assert!(report.contains("Network: 192.168.1.0/24\n"));
        assert!(report.contains("Netmask: 255.255.255.0\n"));
        assert!(report.contains("Broadcast: 192.168.1.255\n"));
        assert!(report.contains("Usable Hosts: 254\n"));
    }

    #[test]
    fn host_route_report() {
        let report = text(json!({ "operation": "info", "ip": "192.168.1.1/32" }));
        assert!(!report.contains("Broadcast"));
        assert!(report.contains("Hosts/Net: 1\n"));
    }

    #[test]
    fn netmask_report() {
        let report = text(json!({ "operation": "netmask", "ip": "10.0.0.0/27" }));
        assert!(report.contains("Wildcard: 0.0.0.31\n"));
        assert!(report.contains("Hex netmask: 0xFFFFFFE0\n"));
    }

    #[test]
    fn prefix_is_accepted_and_ignored() {
        let report = text(json!({ "operation": "netmask", "ip": "172.16.0.0/16", "prefix": 20 }));
        assert!(report.contains("Hex netmask: 0xFFFF0000\n"));
    }

    #[test]
    fn non_numeric_prefix_does_not_break_info() {
        for prefix in [json!("26"), json!(null), json!({ "bits": 26 })] {
            let report = text(json!({ "operation": "info", "ip": "10.0.0.0/8", "prefix": prefix }));
            assert!(report.contains("Usable Hosts: 16777214\n"), "{}", report);
        }
    }

    #[test]
    fn missing_or_non_string_ip_is_a_cidr_error() {
        for args in [
            json!({ "operation": "info" }),
            json!({ "operation": "info", "ip": 42 }),
            json!({ "operation": "info", "ip": null }),
        ] {
            let err = run(args).unwrap_err();
            assert!(err.contains("CIDR notation"), "{}", err);
        }
    }

    #[test]
    fn missing_operation_is_an_argument_error() {
        let err = run(json!({ "ip": "10.0.0.0/8" })).unwrap_err();
        assert!(err.starts_with("Invalid arguments: "), "{}", err);

        let err = IpcalcArgs::from_value(json!({ "operation": 5, "ip": "10.0.0.0/8" })).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn calculator_errors_pass_through_unchanged() {
        let args = IpcalcArgs::from_value(json!({ "operation": "split", "ip": "10.0.0.0/8" })).unwrap();
        let err = args.run().unwrap_err();
        assert_eq!(
            err,
            ToolError::Ipcalc(IpcalcError::UnsupportedOperation("split".to_string()))
        );
        assert_eq!(err.to_string(), "Operation 'split' is not supported");
    }

    #[test]
    fn unknown_and_unsupported_operations() {
        let err = run(json!({ "operation": "explode", "ip": "10.0.0.0/8" })).unwrap_err();
        assert_eq!(err, "Unknown operation: explode");

        let err = run(json!({ "operation": "split", "ip": "10.0.0.0/8", "prefix": 10 })).unwrap_err();
        assert_eq!(err, "Operation 'split' is not supported");
    }
}

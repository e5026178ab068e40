/// IP Calculator MCP Server
///
/// An MCP server exposing an IPv4 CIDR calculator as the `ipcalc` tool.
/// - core: MCP protocol plumbing, transports and configuration
/// - tools: MCP tool registrations
/// - ipcalc: the calculator itself, usable without any server

pub mod core;
pub mod ipcalc;
pub mod tools;

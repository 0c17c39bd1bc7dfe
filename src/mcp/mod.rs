//! MCP (Model Context Protocol) module
//!
//! Implements the MCP server protocol for tool invocation over HTTP.

pub mod client;
pub mod http;
pub mod server;
pub mod tools;
pub mod types;

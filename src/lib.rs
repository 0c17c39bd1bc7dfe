//! Weather MCP Server Library
//!
//! A Model Context Protocol (MCP) server exposing weather alerts and forecasts
//! from the National Weather Service API, protected by bearer tokens issued by
//! an external identity provider.

pub mod auth;
pub mod config;
pub mod error;
pub mod mcp;
pub mod weather;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use error::{Result, WeatherMcpError};

//! Weather API module
//!
//! Contains types, the HTTP client and text formatting for the weather API.

pub mod client;
pub mod format;
pub mod types;

//! Authentication module
//!
//! Token verification, caller identity resolution and OAuth discovery metadata.

pub mod metadata;
pub mod middleware;
pub mod userinfo;
pub mod verifier;

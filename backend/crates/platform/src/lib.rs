//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Client identification (forwarded header / peer address to [`client::ClientKey`])
//! - Rate limiting vocabulary (window configuration and admit/deny decisions)

pub mod client;
pub mod rate_limit;

//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of vocabulary shared by the
//! rate limiter and the API binary:
//! - Common error types and result aliases
//! - HTTP status mapping for errors that reach the client
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all features.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}

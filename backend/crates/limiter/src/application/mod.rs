//! Application Layer - Use Cases
//!
//! Orchestrates client identification, the domain evaluation and the
//! counter store.

pub mod config;
pub mod window_counter;

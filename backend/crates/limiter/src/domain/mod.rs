//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (WindowRecord)
//! - Time source abstraction (Clock)
//! - Domain services (fixed-window evaluation)
//! - Repository traits (CounterStore)

pub mod clock;
pub mod entities;
pub mod repository;
pub mod services;

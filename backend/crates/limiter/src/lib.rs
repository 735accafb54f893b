//! Per-client Rate Limiter
//!
//! Clean Architecture structure:
//! - `domain/` - Window record, fixed-window evaluation, store trait
//! - `application/` - The window counter use case and its configuration
//! - `infra/` - Redis and in-memory counter stores
//! - `presentation/` - HTTP middleware, handlers and router
//!
//! ## Policy
//! - Clients are keyed by IP (`X-Forwarded-For` first entry, else peer address)
//! - A request whose client cannot be identified is admitted (fail-open)
//! - Any counter store failure aborts the check and surfaces as a 5xx (fail-closed)

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{ConsistencyMode, LimiterConfig};
pub use application::window_counter::WindowCounter;
pub use domain::clock::{Clock, ManualClock, SystemClock};
pub use domain::entities::WindowRecord;
pub use domain::repository::CounterStore;
pub use error::{RateLimitError, RateLimitResult};
pub use infra::memory::InMemoryCounterStore;
pub use infra::redis::RedisCounterStore;
pub use presentation::router::limiter_router;

pub use platform::client::{ClientIdentifier, ClientKey, IdentityError};
pub use platform::rate_limit::{Decision, RateLimitConfig};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

//! Rate Limiter Router

use crate::application::window_counter::WindowCounter;
use crate::domain::clock::Clock;
use crate::domain::repository::CounterStore;
use crate::presentation::handlers;
use crate::presentation::middleware::{LimiterState, enforce_rate_limit};
use axum::{Router, middleware, routing::get};
use std::sync::Arc;

/// Create the router: `/` behind the limiter, `/health` outside it
pub fn limiter_router<S, C>(counter: WindowCounter<S, C>) -> Router
where
    S: CounterStore + Send + Sync + 'static,
    C: Clock + 'static,
{
    let state = LimiterState {
        counter: Arc::new(counter),
    };

    let limited = Router::new()
        .route("/", get(handlers::index))
        .route_layer(middleware::from_fn_with_state(
            state,
            enforce_rate_limit::<S, C>,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(limited)
}

//! Rate Limit Middleware

use crate::application::window_counter::WindowCounter;
use crate::domain::clock::Clock;
use crate::domain::repository::CounterStore;
use crate::presentation::dto::BlockedResponse;
use axum::Json;
use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::rate_limit::Decision;
use std::net::SocketAddr;
use std::sync::Arc;

/// Middleware state
pub struct LimiterState<S, C>
where
    S: CounterStore,
    C: Clock,
{
    pub counter: Arc<WindowCounter<S, C>>,
}

impl<S, C> Clone for LimiterState<S, C>
where
    S: CounterStore,
    C: Clock,
{
    fn clone(&self) -> Self {
        Self {
            counter: self.counter.clone(),
        }
    }
}

/// Middleware that rejects clients over their window limit
///
/// Needs the server started with `into_make_service_with_connect_info`;
/// without a peer address only `X-Forwarded-For` can identify the client.
pub async fn enforce_rate_limit<S, C>(
    State(state): State<LimiterState<S, C>>,
    req: Request<Body>,
    next: Next,
) -> Response
where
    S: CounterStore + Send + Sync + 'static,
    C: Clock + 'static,
{
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.to_string())
        .unwrap_or_default();

    let decision = state.counter.check(req.headers(), &remote_addr).await;

    match decision {
        Ok(Decision::Admit) => next.run(req).await,
        Ok(Decision::Deny) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(BlockedResponse::too_many_calls()),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

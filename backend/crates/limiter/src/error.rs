//! Rate Limiter Error Types
//!
//! This module provides limiter-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.
//!
//! Identity failures and store failures are kept apart on purpose: the
//! former is recovered inside the counter (the request is admitted), the
//! latter always reaches the HTTP layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::client::IdentityError;
use thiserror::Error;

/// Limiter-specific result type alias
pub type RateLimitResult<T> = Result<T, RateLimitError>;

#[derive(Debug, Error)]
pub enum RateLimitError {
    /// Client IP could not be determined from header or peer address
    #[error("Client identity unresolvable: {0}")]
    IdentityUnresolvable(#[from] IdentityError),

    /// Counter store could not be reached
    #[error("Counter store unavailable: {0}")]
    StoreUnavailable(String),

    /// Counter store was reached but the command failed
    #[error("Counter store operation failed: {0}")]
    StoreOperationFailed(String),
}

impl RateLimitError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RateLimitError::IdentityUnresolvable(_) => StatusCode::BAD_REQUEST,
            RateLimitError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RateLimitError::StoreOperationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RateLimitError::IdentityUnresolvable(_) => ErrorKind::BadRequest,
            RateLimitError::StoreUnavailable(_) => ErrorKind::ServiceUnavailable,
            RateLimitError::StoreOperationFailed(_) => ErrorKind::InternalServerError,
        }
    }

    /// Store failures are never recovered locally
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            RateLimitError::StoreUnavailable(_) | RateLimitError::StoreOperationFailed(_)
        )
    }

    pub(crate) fn log(&self) {
        match self {
            RateLimitError::StoreUnavailable(e) => {
                tracing::error!(error = %e, "Counter store unavailable");
            }
            RateLimitError::StoreOperationFailed(e) => {
                tracing::error!(error = %e, "Counter store operation failed");
            }
            RateLimitError::IdentityUnresolvable(e) => {
                tracing::debug!(error = %e, "Admitting request without client identity");
            }
        }
    }
}

impl From<redis::RedisError> for RateLimitError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_timeout()
        {
            RateLimitError::StoreUnavailable(err.to_string())
        } else {
            RateLimitError::StoreOperationFailed(err.to_string())
        }
    }
}

impl From<RateLimitError> for AppError {
    fn from(err: RateLimitError) -> Self {
        // Store details stay in the logs; clients get a generic message
        match err.kind() {
            ErrorKind::ServiceUnavailable => AppError::service_unavailable("Service unavailable")
                .with_action("Please retry later"),
            ErrorKind::InternalServerError => AppError::internal("Internal server error"),
            kind => AppError::new(kind, err.to_string()),
        }
    }
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_server_errors() {
        let unavailable = RateLimitError::StoreUnavailable("refused".into());
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(unavailable.is_store_failure());

        let failed = RateLimitError::StoreOperationFailed("WRONGTYPE".into());
        assert_eq!(failed.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(failed.is_store_failure());
    }

    #[test]
    fn test_identity_error_is_not_store_failure() {
        let err = RateLimitError::from(IdentityError::Unresolvable {
            remote_addr: "bogus".into(),
        });
        assert!(!err.is_store_failure());
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_redis_error_classification() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = RateLimitError::from(redis::RedisError::from(io_err));
        assert!(matches!(err, RateLimitError::StoreUnavailable(_)));

        let type_err = redis::RedisError::from((redis::ErrorKind::TypeError, "WRONGTYPE"));
        let err = RateLimitError::from(type_err);
        assert!(matches!(err, RateLimitError::StoreOperationFailed(_)));
    }

    #[test]
    fn test_app_error_hides_store_details() {
        let app_err: AppError =
            RateLimitError::StoreOperationFailed("ERR secret internals".into()).into();
        assert_eq!(app_err.status_code(), 500);
        assert!(!app_err.message().contains("secret"));
    }

    #[test]
    fn test_store_unavailable_app_error_asks_for_retry() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let app_err: AppError = RateLimitError::from(redis::RedisError::from(io_err)).into();
        assert_eq!(app_err.kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(app_err.action(), Some("Please retry later"));
    }

    #[test]
    fn test_into_response_status() {
        let response = RateLimitError::StoreUnavailable("down".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

//! Error types for the routing core and the HTTP surface.
//!
//! [`RoutingError`] is what the routing core returns. [`ServiceError`] is
//! the edge error: it maps every routing and database failure to the same
//! "database unavailable" response, so callers cannot tell a routing
//! problem from an ordinary connectivity failure.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::{Intent, PoolKey, ScopeHandle};

/// Errors raised by the pool registry, intent tracker, resolver and scopes.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// Missing or invalid pool registration or configuration value.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A default-pool lookup was requested but no default was designated.
    #[error("no default pool is defined")]
    DefaultPoolUndefined,

    /// Intent was queried outside any declared unit of work.
    #[error("no active scope")]
    NoActiveScope,

    /// A connection could not be checked out from the selected pool.
    #[error("connection unavailable from {key} pool: {source}")]
    ConnectionUnavailable {
        /// Pool the checkout was attempted on.
        key: PoolKey,
        /// Underlying pool or driver error.
        #[source]
        source: sqlx::Error,
    },

    /// A scope was begun while another one is still active on the same context.
    #[error("scope {0} is still active on this context")]
    ScopeAlreadyActive(ScopeHandle),

    /// Attempt to change the intent of a scope after it began.
    #[error("scope {scope} was declared {declared}, cannot switch to {requested}")]
    IntentConflict {
        /// Scope whose intent was targeted.
        scope: ScopeHandle,
        /// Intent fixed at scope begin.
        declared: Intent,
        /// Intent that was attempted.
        requested: Intent,
    },

    /// The handle does not name the active scope of this context.
    #[error("scope {0} is closed")]
    ScopeClosed(ScopeHandle),

    /// Statement, commit or rollback failure on a resolved connection.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Structured JSON error response body.
///
/// ```json
/// { "error": { "code": 3001, "message": "database unavailable" } }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Edge error returned by services and HTTP handlers.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status               |
/// |-----------|------------|---------------------------|
/// | 1000–1999 | Validation | 400 Bad Request           |
/// | 3000–3999 | Server     | 500 / 503                 |
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Routing core failure.
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// Query failure on a routed connection.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Routing(RoutingError::Configuration(_) | RoutingError::DefaultPoolUndefined) => {
                3000
            }
            Self::Routing(_) | Self::Database(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Routing(RoutingError::Configuration(_) | RoutingError::DefaultPoolUndefined) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Routing(_) | Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Message shown to clients. Database-layer failures share one message.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidRequest(_) => self.to_string(),
            Self::Routing(RoutingError::Configuration(_) | RoutingError::DefaultPoolUndefined) => {
                "internal error".to_string()
            }
            Self::Routing(_) | Self::Database(_) => "database unavailable".to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.public_message(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

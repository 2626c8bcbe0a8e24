//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Statdesk                               │
//! │                                                                         │
//! │  Handler → Result<T, ApiError>                                          │
//! │       │                                                                 │
//! │       ├── DbError::NotFound ─────────────► 404 NOT_FOUND               │
//! │       ├── Validation / Duplicate / InUse ─► 400 VALIDATION_ERROR        │
//! │       ├── unreadable JSON body ──────────► 400 VALIDATION_ERROR        │
//! │       ├── SyncError::NotLinked ──────────► 409 CONFLICT                 │
//! │       ├── SyncError::Upstream{status} ───► status as received           │
//! │       ├── transport / bad remote data ───► 502 UPSTREAM_ERROR           │
//! │       └── anything else ─────────────────► 500 DATABASE_ERROR/INTERNAL  │
//! │                                                                         │
//! │  Body: { "code": "NOT_FOUND", "message": "Collector not found: …" }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use statdesk_core::CoreError;
use statdesk_db::DbError;
use statdesk_sync::SyncError;

/// API error returned from handlers.
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Collector not found: 6f1c…"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Status received from the statistics service, replayed as is.
    #[serde(skip)]
    pub upstream_status: Option<u16>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// State does not allow the operation (409)
    Conflict,

    /// Statistics service failed (502 or its own status)
    UpstreamError,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::UpstreamError => StatusCode::BAD_GATEWAY,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            upstream_status: None,
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// HTTP status this error is sent with.
    pub fn status(&self) -> StatusCode {
        self.upstream_status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or_else(|| self.code.status())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::Validation(e) => ApiError::validation(e.to_string()),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Corrupt { table, reason } => {
                tracing::error!(%table, %reason, "Corrupt row");
                ApiError::new(ErrorCode::DatabaseError, "Stored data could not be read")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
            CoreError::UnsupportedPeriodicity(_) | CoreError::UnsupportedWeekday(_) => {
                ApiError::validation(err.to_string())
            }
            CoreError::MalformedPayload(_) => {
                ApiError::new(ErrorCode::UpstreamError, err.to_string())
            }
            CoreError::Render(e) => {
                tracing::error!("Export rendering failed: {}", e);
                ApiError::internal("Export rendering failed")
            }
        }
    }
}

/// Converts body rejections (bad JSON, unsupported periodicity, ...) to
/// validation errors.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

/// Converts sync errors to API errors.
impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Store(e) => e.into(),
            SyncError::Core(e) => e.into(),
            SyncError::NotLinked { .. } => ApiError::new(ErrorCode::Conflict, err.to_string()),
            SyncError::Upstream { status } => ApiError {
                upstream_status: Some(status),
                ..ApiError::new(ErrorCode::UpstreamError, err.to_string())
            },
            SyncError::ConnectionFailed(_)
            | SyncError::Timeout(_)
            | SyncError::RequestFailed(_)
            | SyncError::InvalidResponse(_)
            | SyncError::DeserializationFailed(_) => {
                tracing::warn!(error = %err, "Statistics service call failed");
                ApiError::new(ErrorCode::UpstreamError, err.to_string())
            }
            SyncError::InvalidConfig(_)
            | SyncError::InvalidUrl(_)
            | SyncError::Internal(_) => {
                tracing::error!(error = %err, "Sync failure");
                ApiError::internal(err.to_string())
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use statdesk_core::ValidationError;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        let err: ApiError = DbError::not_found("Collector", "x").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = DbError::Validation(ValidationError::Required {
            field: "weekday".into(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = SyncError::NotLinked {
            collector_id: Uuid::nil(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = SyncError::ConnectionFailed("refused".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_upstream_status_replayed() {
        let err: ApiError = SyncError::Upstream { status: 503 }.into();
        assert_eq!(err.code, ErrorCode::UpstreamError);
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::not_found("Client", "42")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"code": "NOT_FOUND", "message": "Client not found: 42"})
        );
    }
}

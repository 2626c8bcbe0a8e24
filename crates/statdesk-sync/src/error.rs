//! # Sync Error Types
//!
//! Error types for remote mirror operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Protocol            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  InvalidResponse        │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  DeserializationFailed  │ │
//! │  │                 │  │  Request        │  │  Upstream (status)      │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │     Store       │  │     Mirror      │                              │
//! │  │                 │  │                 │                              │
//! │  │  Store(DbError) │  │  NotLinked      │                              │
//! │  │  Core(CoreError)│  │                 │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use statdesk_core::CoreError;
use statdesk_db::DbError;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all remote mirror failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid remote configuration.
    #[error("Invalid remote configuration: {0}")]
    InvalidConfig(String),

    /// Invalid remote URL.
    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Could not reach the statistics service.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Request could not be built or sent.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// The service answered with something we cannot interpret.
    #[error("Invalid response from statistics service: {0}")]
    InvalidResponse(String),

    /// Failed to decode a JSON body.
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Non-success status from the service, passed through to the caller.
    #[error("Statistics service responded with status {status}")]
    Upstream { status: u16 },

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// Store failure (includes not-found and validation).
    #[error(transparent)]
    Store(#[from] DbError),

    /// Domain failure (malformed statistics payload and the like).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The collector has no remote mirror yet.
    #[error("Collector {collector_id} is not linked to the statistics service")]
    NotLinked { collector_id: Uuid },

    /// Internal sync error.
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout(0)
        } else if err.is_connect() {
            SyncError::ConnectionFailed(err.to_string())
        } else if err.is_decode() {
            SyncError::DeserializationFailed(err.to_string())
        } else {
            SyncError::RequestFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::DeserializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Returns true if the request may be sent again.
    ///
    /// Only transport failures qualify. A status response from the service,
    /// whatever the code, is an answer and is never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::ConnectionFailed(_) | SyncError::Timeout(_)
        )
    }

    /// Returns true if the failure happened between us and the service.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            SyncError::ConnectionFailed(_) | SyncError::Timeout(_) | SyncError::RequestFailed(_)
        )
    }

    /// Attaches the configured timeout to a bare timeout error.
    pub(crate) fn with_timeout(self, secs: u64) -> Self {
        match self {
            SyncError::Timeout(_) => SyncError::Timeout(secs),
            other => other,
        }
    }
}

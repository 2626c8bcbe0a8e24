//! # Error Types
//!
//! Domain-specific error types for statdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  statdesk-core errors (this file)                                      │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  statdesk-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  statdesk-sync errors (separate crate)                                 │
//! │  └── SyncError        - Remote service / orchestration failures        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → SyncError → ApiError    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Periodicity string is not one of daily/weekly/biweekly/monthly.
    ///
    /// ## When This Occurs
    /// - A stored row or an API payload carries a periodicity value this
    ///   build does not know how to generate periods for
    #[error("Unsupported periodicity: '{0}'")]
    UnsupportedPeriodicity(String),

    /// Weekday string is not one of monday..sunday.
    #[error("Unsupported weekday: '{0}'")]
    UnsupportedWeekday(String),

    /// A statistics payload from the remote service does not have the shape
    /// the export table expects.
    #[error("Malformed statistics payload: {0}")]
    MalformedPayload(String),

    /// Export table could not be rendered.
    #[error("Export rendering failed: {0}")]
    Render(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These are user-facing: they are rejected before any mutation happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// A date range is inverted.
    #[error("{field}: start {start} is after end {end}")]
    InvalidRange {
        field: String,
        start: String,
        end: String,
    },

    /// Invalid format (e.g., invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Entity is still referenced and cannot be deleted.
    ///
    /// ## User Workflow
    /// ```text
    /// Delete Supplier "Acme"
    ///      │
    ///      ▼
    /// Count placements using it: 2
    ///      │
    ///      ▼
    /// InUse { entity: "Supplier", name: "Acme", referenced_by: "placements", count: 2 }
    /// ```
    #[error("Cannot delete {entity} '{name}': used by {count} {referenced_by}")]
    InUse {
        entity: String,
        name: String,
        referenced_by: String,
        count: i64,
    },

    /// Duplicate value (names are unique case-insensitively).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Referenced entity is inactive and cannot be chosen.
    #[error("{entity} '{name}' is inactive")]
    Inactive { entity: String, name: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_use_message() {
        let err = ValidationError::InUse {
            entity: "Supplier".to_string(),
            name: "Acme".to_string(),
            referenced_by: "placements".to_string(),
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "Cannot delete Supplier 'Acme': used by 2 placements"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "weekday".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

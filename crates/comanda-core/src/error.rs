//! # Error Types
//!
//! Domain-specific error types for comanda-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  comanda-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  comanda-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  comanda-engine errors                                                 │
//! │  └── EngineError      - What callers see (reason code + message)       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (IDs, amounts, statuses)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::status::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations or domain logic failures and
/// are translated to reason codes at the engine boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested status transition is not in the lifecycle table.
    #[error("invalid status transition: {from} → {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// A caller named a status outside the allowed enumeration.
    #[error("unknown order status: '{0}'")]
    UnknownStatus(String),

    /// A remove adjustment would drive stock below zero.
    #[error("insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements; they are caught
/// before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Collection is empty where at least one element is required.
    #[error("{field} must not be empty")]
    Empty { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            name: "Flour".to_string(),
            available: 10,
            requested: 15,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for Flour: available 10, requested 15"
        );

        let err = CoreError::InvalidTransition {
            from: OrderStatus::Completed,
            to: OrderStatus::Preparing,
        };
        assert_eq!(err.to_string(), "invalid status transition: completed → preparing");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Empty {
            field: "items".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

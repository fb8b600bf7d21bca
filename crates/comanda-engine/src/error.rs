//! # Engine Error Types
//!
//! The error surface callers of the engines see.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Rejection Categories                               │
//! │                                                                         │
//! │  Validation  - malformed input, caller's fault        (400-equivalent) │
//! │  State       - missing object or wrong lifecycle  (404/409-equivalent) │
//! │  Policy      - rate limit, balance/limit, token   (403/429-equivalent) │
//! │  System      - store unavailable, transient           (500-equivalent) │
//! │                                                                         │
//! │  Retry guidance:                                                        │
//! │  Validation/State → retry is useless                                    │
//! │  Policy (rate limit) → retry later                                      │
//! │  System → retry now with backoff                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every rejection carries a stable machine-readable [`ReasonCode`] plus a
//! human message, so callers can render a precise error without parsing
//! strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use comanda_db::DbError;
use comanda_core::CoreError;

// =============================================================================
// Reason Codes
// =============================================================================

/// Stable machine-readable rejection reasons.
///
/// Serialized in SCREAMING_SNAKE_CASE; these strings are API surface and
/// must never change meaning once shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    // Validation
    EmptyOrder,
    TooManyItems,
    InvalidQuantity,
    TableRequired,
    TextTooLong,
    InvalidMethod,
    InvalidAmount,
    InvalidReason,
    InvalidStatus,

    // State
    OrderNotFound,
    ItemNotFound,
    ProductNotFound,
    ProductUnavailable,
    TableNotFound,
    IngredientNotFound,
    InvalidState,
    AlreadyPaid,
    InsufficientStock,

    // Policy
    RateLimited,
    ExceedsBalance,
    AmountMismatch,
    AmountLimit,
    InvalidToken,

    // System
    StoreUnavailable,
}

/// How a caller should react to a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller's input is wrong; retrying the same request is useless.
    Validation,
    /// The target object is missing or in the wrong lifecycle state.
    State,
    /// A policy gate fired (rate limit, balance bound, token).
    Policy,
    /// Transient infrastructure failure; retry with backoff.
    System,
}

impl ReasonCode {
    /// The SCREAMING_SNAKE_CASE wire form.
    pub fn as_str(self) -> &'static str {
        match self {
            ReasonCode::EmptyOrder => "EMPTY_ORDER",
            ReasonCode::TooManyItems => "TOO_MANY_ITEMS",
            ReasonCode::InvalidQuantity => "INVALID_QUANTITY",
            ReasonCode::TableRequired => "TABLE_REQUIRED",
            ReasonCode::TextTooLong => "TEXT_TOO_LONG",
            ReasonCode::InvalidMethod => "INVALID_METHOD",
            ReasonCode::InvalidAmount => "INVALID_AMOUNT",
            ReasonCode::InvalidReason => "INVALID_REASON",
            ReasonCode::InvalidStatus => "INVALID_STATUS",
            ReasonCode::OrderNotFound => "ORDER_NOT_FOUND",
            ReasonCode::ItemNotFound => "ITEM_NOT_FOUND",
            ReasonCode::ProductNotFound => "PRODUCT_NOT_FOUND",
            ReasonCode::ProductUnavailable => "PRODUCT_UNAVAILABLE",
            ReasonCode::TableNotFound => "TABLE_NOT_FOUND",
            ReasonCode::IngredientNotFound => "INGREDIENT_NOT_FOUND",
            ReasonCode::InvalidState => "INVALID_STATE",
            ReasonCode::AlreadyPaid => "ALREADY_PAID",
            ReasonCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ReasonCode::RateLimited => "RATE_LIMITED",
            ReasonCode::ExceedsBalance => "EXCEEDS_BALANCE",
            ReasonCode::AmountMismatch => "AMOUNT_MISMATCH",
            ReasonCode::AmountLimit => "AMOUNT_LIMIT",
            ReasonCode::InvalidToken => "INVALID_TOKEN",
            ReasonCode::StoreUnavailable => "STORE_UNAVAILABLE",
        }
    }

    /// Which taxonomy bucket the code falls into.
    pub fn category(self) -> ErrorCategory {
        match self {
            ReasonCode::EmptyOrder
            | ReasonCode::TooManyItems
            | ReasonCode::InvalidQuantity
            | ReasonCode::TableRequired
            | ReasonCode::TextTooLong
            | ReasonCode::InvalidMethod
            | ReasonCode::InvalidAmount
            | ReasonCode::InvalidReason
            | ReasonCode::InvalidStatus => ErrorCategory::Validation,

            ReasonCode::OrderNotFound
            | ReasonCode::ItemNotFound
            | ReasonCode::ProductNotFound
            | ReasonCode::ProductUnavailable
            | ReasonCode::TableNotFound
            | ReasonCode::IngredientNotFound
            | ReasonCode::InvalidState
            | ReasonCode::AlreadyPaid
            | ReasonCode::InsufficientStock => ErrorCategory::State,

            ReasonCode::RateLimited
            | ReasonCode::ExceedsBalance
            | ReasonCode::AmountMismatch
            | ReasonCode::AmountLimit
            | ReasonCode::InvalidToken => ErrorCategory::Policy,

            ReasonCode::StoreUnavailable => ErrorCategory::System,
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Engine Error
// =============================================================================

/// Errors returned by the engines.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A request was rejected with a stable reason code.
    #[error("{code}: {message}")]
    Rejected { code: ReasonCode, message: String },

    /// The store failed; the transaction rolled back completely.
    #[error("store failure: {0}")]
    Store(#[from] DbError),
}

impl EngineError {
    /// Shorthand for building a rejection.
    pub fn rejected(code: ReasonCode, message: impl Into<String>) -> Self {
        EngineError::Rejected {
            code,
            message: message.into(),
        }
    }

    /// The stable reason code for this error.
    pub fn code(&self) -> ReasonCode {
        match self {
            EngineError::Rejected { code, .. } => *code,
            EngineError::Store(_) => ReasonCode::StoreUnavailable,
        }
    }

    /// Retry guidance bucket.
    pub fn category(&self) -> ErrorCategory {
        self.code().category()
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::InvalidTransition { .. } => ReasonCode::InvalidState,
            CoreError::UnknownStatus(_) => ReasonCode::InvalidStatus,
            CoreError::InsufficientStock { .. } => ReasonCode::InsufficientStock,
            CoreError::Validation(v) => validation_code(v),
        };
        EngineError::Rejected {
            code,
            message: err.to_string(),
        }
    }
}

impl From<comanda_core::ValidationError> for EngineError {
    fn from(err: comanda_core::ValidationError) -> Self {
        CoreError::from(err).into()
    }
}

// Raw sqlx errors surface from transaction commit/rollback; everything
// else is already mapped by the repository layer.
impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Store(DbError::from(err))
    }
}

fn validation_code(err: &comanda_core::ValidationError) -> ReasonCode {
    use comanda_core::ValidationError as V;
    match err {
        V::Empty { .. } => ReasonCode::EmptyOrder,
        V::Required { .. } => ReasonCode::TableRequired,
        V::TooLong { .. } => ReasonCode::TextTooLong,
        V::MustBePositive { field } | V::OutOfRange { field, .. } => match field.as_str() {
            "amount" => ReasonCode::InvalidAmount,
            "items" => ReasonCode::TooManyItems,
            _ => ReasonCode::InvalidQuantity,
        },
        V::NotAllowed { .. } => ReasonCode::InvalidMethod,
    }
}

/// Convenience type alias for Results with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

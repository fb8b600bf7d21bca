//! # Validation Module
//!
//! Input validation for order and payment submissions.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend                                                     │
//! │  └── Basic format checks, immediate user feedback                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  └── Runs before any engine touches the database                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── NOT NULL / UNIQUE / foreign key constraints                       │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::OrderType;
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_ITEMS, MAX_PAYMENT_AMOUNT};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Order Submission
// =============================================================================

/// Validates the item count of an order submission.
///
/// ## Rules
/// - At least one line item
/// - At most [`MAX_ORDER_ITEMS`]
pub fn validate_item_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }

    if count > MAX_ORDER_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_ITEMS as i64,
        });
    }

    Ok(())
}

/// Validates a line item quantity.
///
/// ## Example
/// ```rust
/// use comanda_core::validation::validate_quantity;
///
/// assert!(validate_quantity(2).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(1_000).is_err());
/// ```
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates that dine-in orders carry a table reference.
pub fn validate_table_binding(order_type: OrderType, table_id: Option<&str>) -> ValidationResult<()> {
    if order_type == OrderType::DineIn && table_id.map_or(true, |t| t.trim().is_empty()) {
        return Err(ValidationError::Required {
            field: "table_id".to_string(),
        });
    }
    Ok(())
}

/// Validates an optional free-text field against a length cap.
pub fn validate_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    if let Some(value) = value {
        if value.chars().count() > max {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Payments
// =============================================================================

/// Validates a payment amount.
///
/// ## Rules
/// - Strictly positive
/// - Staff path: at most [`MAX_PAYMENT_AMOUNT`] (fraud guard); the customer
///   path is bounded by the exact-match rule instead.
pub fn validate_payment_amount(amount: i64, staff_path: bool) -> ValidationResult<()> {
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    if staff_path && amount > MAX_PAYMENT_AMOUNT {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 1,
            max: MAX_PAYMENT_AMOUNT,
        });
    }

    Ok(())
}

// =============================================================================
// Customer Gateway Sanitization
// =============================================================================

/// Strips control characters and trims customer-supplied free text.
///
/// The self-order path accepts unauthenticated input; names and special
/// instructions are sanitized before they reach the order engine.
pub fn sanitize_customer_text(raw: &str, max: usize) -> String {
    raw.chars()
        .filter(|c| !c.is_control())
        .take(max)
        .collect::<String>()
        .trim()
        .to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_count() {
        assert!(validate_item_count(1).is_ok());
        assert!(validate_item_count(MAX_ORDER_ITEMS).is_ok());
        assert!(validate_item_count(0).is_err());
        assert!(validate_item_count(MAX_ORDER_ITEMS + 1).is_err());
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_dine_in_requires_table() {
        assert!(validate_table_binding(OrderType::DineIn, Some("table-1")).is_ok());
        assert!(validate_table_binding(OrderType::DineIn, None).is_err());
        assert!(validate_table_binding(OrderType::DineIn, Some("  ")).is_err());

        // Takeaway and delivery don't need a table
        assert!(validate_table_binding(OrderType::Takeaway, None).is_ok());
        assert!(validate_table_binding(OrderType::Delivery, None).is_ok());
    }

    #[test]
    fn test_payment_amount() {
        assert!(validate_payment_amount(849_150, true).is_ok());
        assert!(validate_payment_amount(0, true).is_err());
        assert!(validate_payment_amount(-500, true).is_err());
        assert!(validate_payment_amount(MAX_PAYMENT_AMOUNT + 1, true).is_err());

        // Customer path has no hard maximum, only positivity
        assert!(validate_payment_amount(MAX_PAYMENT_AMOUNT + 1, false).is_ok());
        assert!(validate_payment_amount(0, false).is_err());
    }

    #[test]
    fn test_sanitize_customer_text() {
        assert_eq!(sanitize_customer_text("  Ana\n", 50), "Ana");
        assert_eq!(sanitize_customer_text("a\u{0007}b", 50), "ab");
        assert_eq!(sanitize_customer_text("abcdef", 3), "abc");
    }
}

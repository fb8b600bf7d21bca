//! # Order Lifecycle State Machine
//!
//! The authoritative transition rules for an order's status.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  pending ──► confirmed ──► preparing ──► ready ──► served ──► completed │
//! │     │            │            │           │          │            ▲     │
//! │     │            │            │           │          │            │     │
//! │     └────────────┴────────────┴───────────┴──────────┴── full payment   │
//! │     │            │            │           │          │                  │
//! │     ▼            ▼            ▼           ▼          ▼                  │
//! │                        cancelled                                        │
//! │                                                                         │
//! │  Terminal states: completed, cancelled (no transitions out)            │
//! │                                                                         │
//! │  Full payment settlement may complete an order from ANY non-terminal   │
//! │  state - a counter sale is paid while still pending, a table order     │
//! │  after being served.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every transition that actually happens is recorded in the append-only
//! `order_status_history` table by the order engine; this module only
//! answers "is this transition legal?".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order submitted, not yet acknowledged by staff.
    Pending,
    /// Staff acknowledged the order.
    Confirmed,
    /// Kitchen is working on it.
    Preparing,
    /// Ready for pickup / serving.
    Ready,
    /// Delivered to the table / handed over.
    Served,
    /// Fully paid and closed.
    Completed,
    /// Abandoned before completion.
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Served,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// The stable string form, matching the database representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Served => "served",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parses a caller-supplied status name.
    ///
    /// Transition requests name the target status as a string; anything
    /// outside the enumeration is rejected with `UnknownStatus`.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.trim() {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready" => Ok(OrderStatus::Ready),
            "served" => Ok(OrderStatus::Served),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }

    /// Whether no further transitions are permitted from this status.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Whether entering this status should notify the customer.
    ///
    /// Customer-visible transitions queue a best-effort notification;
    /// the rest are internal kitchen bookkeeping.
    #[inline]
    pub const fn is_customer_visible(&self) -> bool {
        matches!(
            self,
            OrderStatus::Preparing | OrderStatus::Ready | OrderStatus::Completed
        )
    }

    /// Whether `self → next` is a legal transition.
    ///
    /// ## Rules
    /// - Nothing leaves a terminal state.
    /// - `cancelled` is reachable from any non-terminal state.
    /// - `completed` is reachable from any non-terminal state, because full
    ///   payment settlement closes the order wherever it stands.
    /// - Otherwise the kitchen chain is strictly ordered:
    ///   pending → confirmed → preparing → ready → served.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }

        match next {
            OrderStatus::Cancelled | OrderStatus::Completed => true,
            OrderStatus::Confirmed => *self == OrderStatus::Pending,
            OrderStatus::Preparing => *self == OrderStatus::Confirmed,
            OrderStatus::Ready => *self == OrderStatus::Preparing,
            OrderStatus::Served => *self == OrderStatus::Ready,
            OrderStatus::Pending => false,
        }
    }

    /// Validates a transition, returning a typed error for illegal ones.
    pub fn transition_to(&self, next: OrderStatus) -> Result<OrderStatus, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition {
                from: *self,
                to: next,
            })
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::parse(s)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kitchen_chain_is_strictly_ordered() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Preparing));
        assert!(Preparing.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Served));
        assert!(Served.can_transition_to(Completed));

        // No skipping ahead, no going back
        assert!(!Pending.can_transition_to(Preparing));
        assert!(!Confirmed.can_transition_to(Ready));
        assert!(!Ready.can_transition_to(Preparing));
        assert!(!Served.can_transition_to(Pending));
    }

    #[test]
    fn test_cancel_from_any_non_terminal() {
        use OrderStatus::*;

        for status in [Pending, Confirmed, Preparing, Ready, Served] {
            assert!(status.can_transition_to(Cancelled), "{status} → cancelled");
        }
    }

    #[test]
    fn test_payment_completes_from_any_non_terminal() {
        use OrderStatus::*;

        for status in [Pending, Confirmed, Preparing, Ready, Served] {
            assert!(status.can_transition_to(Completed), "{status} → completed");
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        use OrderStatus::*;

        for terminal in [Completed, Cancelled] {
            assert!(terminal.is_terminal());
            for next in OrderStatus::ALL {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_parse_rejects_unknown_values() {
        assert_eq!(OrderStatus::parse("preparing").unwrap(), OrderStatus::Preparing);
        assert_eq!(OrderStatus::parse(" ready ").unwrap(), OrderStatus::Ready);

        assert!(OrderStatus::parse("shipped").is_err());
        assert!(OrderStatus::parse("").is_err());
        assert!(OrderStatus::parse("COMPLETED").is_err());
    }

    #[test]
    fn test_customer_visible_set() {
        use OrderStatus::*;

        assert!(Preparing.is_customer_visible());
        assert!(Ready.is_customer_visible());
        assert!(Completed.is_customer_visible());

        assert!(!Pending.is_customer_visible());
        assert!(!Confirmed.is_customer_visible());
        assert!(!Served.is_customer_visible());
        assert!(!Cancelled.is_customer_visible());
    }

    #[test]
    fn test_transition_to_returns_typed_error() {
        let err = OrderStatus::Completed
            .transition_to(OrderStatus::Preparing)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
    }
}

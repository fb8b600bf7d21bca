//! # Domain Types
//!
//! Core domain types used throughout Comanda.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │    Payment      │   │   Ingredient    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  status         │   │  order_id (FK)  │   │  current_stock  │       │
//! │  │  total_amount   │   │  method         │   │  minimum_stock  │       │
//! │  │  table_id (FK)  │   │  amount         │   │  unit_cost      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Derived, never stored:                                                 │
//! │  • IngredientStatus  = f(current_stock, minimum_stock)                  │
//! │  • Ingredient value  = current_stock × unit_cost                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! `OrderItem.unit_price` is the product price read during order creation,
//! frozen for history. Later price changes never rewrite a past order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::status::OrderStatus;

// =============================================================================
// Actor
// =============================================================================

/// An authenticated staff identity supplied by the auth layer.
///
/// Customer self-order calls carry no actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    /// Role name as issued by the auth layer (server, counter, kitchen, ...).
    pub role: String,
}

// =============================================================================
// Order Type
// =============================================================================

/// How the order is fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Eaten at a table; requires a table reference.
    DineIn,
    Takeaway,
    Delivery,
}

// =============================================================================
// Order Item Status
// =============================================================================

/// Kitchen workflow status for a single line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderItemStatus {
    Pending,
    Preparing,
    Ready,
    Served,
}

impl Default for OrderItemStatus {
    fn default() -> Self {
        OrderItemStatus::Pending
    }
}

// =============================================================================
// Payment Enums
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    DigitalWallet,
}

impl PaymentMethod {
    /// Parses a caller-supplied method name; anything outside the allowed
    /// set is rejected by the payment engine.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "cash" => Some(PaymentMethod::Cash),
            "credit_card" => Some(PaymentMethod::CreditCard),
            "debit_card" => Some(PaymentMethod::DebitCard),
            "digital_wallet" => Some(PaymentMethod::DigitalWallet),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

// =============================================================================
// Stock Enums
// =============================================================================

/// Direction of a stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum StockOperation {
    Add,
    Remove,
}

/// Why a stock adjustment happened. Every audit row carries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum StockReason {
    Purchase,
    Sale,
    Spoilage,
    ManualAdjustment,
    InventoryCount,
    Return,
    Damage,
    Theft,
    Expired,
}

impl StockReason {
    /// Parses a caller-supplied reason; the stock ledger rejects anything
    /// outside this enumeration.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "purchase" => Some(StockReason::Purchase),
            "sale" => Some(StockReason::Sale),
            "spoilage" => Some(StockReason::Spoilage),
            "manual_adjustment" => Some(StockReason::ManualAdjustment),
            "inventory_count" => Some(StockReason::InventoryCount),
            "return" => Some(StockReason::Return),
            "damage" => Some(StockReason::Damage),
            "theft" => Some(StockReason::Theft),
            "expired" => Some(StockReason::Expired),
            _ => None,
        }
    }
}

/// Derived stock health indicator.
///
/// Always computed from `current_stock` vs `minimum_stock`, never
/// persisted, so the two representations cannot drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientStatus {
    Ok,
    Low,
    Out,
}

// =============================================================================
// Product
// =============================================================================

/// A sellable product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on tickets and receipts.
    pub name: String,

    pub description: Option<String>,

    /// Current price in minor currency units. This is the authoritative
    /// price; client-submitted prices are never trusted.
    pub price: i64,

    /// Availability flag. Manually set, and overridden by the ingredient
    /// availability sync when the product has a recipe.
    pub is_available: bool,

    /// Soft-delete flag.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_minor(self.price)
    }

    /// Whether the product can be put on an order right now.
    #[inline]
    pub fn is_orderable(&self) -> bool {
        self.is_active && self.is_available
    }
}

// =============================================================================
// Dining Table
// =============================================================================

/// A physical table with a QR code for the self-order path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: String,
    pub table_number: String,
    pub seating_capacity: i64,
    pub location: Option<String>,

    /// Derived-but-persisted: true while a non-terminal dine-in order
    /// references this table. Set on order creation, cleared on
    /// completion/cancellation in the same transaction.
    pub is_occupied: bool,

    /// Token embedded in the printed QR code.
    pub qr_code: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Order
// =============================================================================

/// An order header. Never hard-deleted (audit requirement).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    pub table_id: Option<String>,
    /// Staff member who took the order; None on the customer path.
    pub user_id: Option<String>,
    pub customer_name: Option<String>,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub discount_amount: i64,
    /// Invariant: `total_amount == subtotal + tax_amount - discount_amount`.
    pub total_amount: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub served_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_minor(self.total_amount)
    }

    /// Checks the amount invariant. Used by tests and assertions, the
    /// aggregate builder guarantees it on write.
    pub fn amounts_consistent(&self) -> bool {
        self.total_amount == self.subtotal + self.tax_amount - self.discount_amount
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item in an order.
/// Uses the snapshot pattern to freeze product data at order time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name at order time (frozen).
    pub name_snapshot: String,
    /// Quantity ordered, always ≥ 1.
    pub quantity: i64,
    /// Unit price at order time (frozen).
    pub unit_price: i64,
    /// `quantity × unit_price`.
    pub total_price: i64,
    pub special_instructions: Option<String>,
    /// Kitchen workflow status.
    pub status: OrderItemStatus,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns the frozen unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_minor(self.unit_price)
    }
}

// =============================================================================
// Order Status History
// =============================================================================

/// One append-only history row per status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderStatusChange {
    pub id: String,
    pub order_id: String,
    pub previous_status: OrderStatus,
    pub new_status: OrderStatus,
    /// Staff actor, or None for system/customer-driven transitions.
    pub changed_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Payment
// =============================================================================

/// A payment towards an order.
/// An order can have multiple payments for split tender scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub method: PaymentMethod,
    /// Amount in minor units, always > 0.
    pub amount: i64,
    pub status: PaymentStatus,
    /// External reference (card auth code, wallet txn id, ...).
    pub reference_number: Option<String>,
    /// Staff member who took the payment; None on the customer path.
    pub processed_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_minor(self.amount)
    }
}

// =============================================================================
// Ingredient
// =============================================================================

/// A stocked ingredient. Mutated exclusively through the stock ledger so
/// the audit trail stays truthful.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    /// Unit of measure label (g, ml, pcs). Stock counts are integer base
    /// units of this measure so the ledger replays exactly.
    pub unit: String,
    pub current_stock: i64,
    pub minimum_stock: i64,
    pub maximum_stock: i64,
    /// Cost per base unit, minor currency units.
    pub unit_cost: i64,
    pub supplier: Option<String>,
    pub is_active: bool,
    pub last_restocked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ingredient {
    /// Derived stock health: out (0) / low (< minimum) / ok.
    pub fn status(&self) -> IngredientStatus {
        if self.current_stock == 0 {
            IngredientStatus::Out
        } else if self.current_stock < self.minimum_stock {
            IngredientStatus::Low
        } else {
            IngredientStatus::Ok
        }
    }

    /// Total stock value: `current_stock × unit_cost`.
    pub fn total_value(&self) -> i64 {
        self.current_stock * self.unit_cost
    }
}

// =============================================================================
// Ingredient History
// =============================================================================

/// Immutable append-only audit record for a stock adjustment.
///
/// Invariant: `new_stock == previous_stock + quantity` for add operations
/// and `previous_stock - quantity` for remove; replaying an ingredient's
/// history from zero reconstructs its current stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct IngredientHistoryEntry {
    pub id: String,
    pub ingredient_id: String,
    pub operation: StockOperation,
    pub quantity: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub reason: StockReason,
    pub notes: Option<String>,
    pub adjusted_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Recipe
// =============================================================================

/// One line of a product's recipe: the ingredient and how much of it one
/// unit of the product consumes. Unique per (product, ingredient).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RecipeLine {
    pub product_id: String,
    pub ingredient_id: String,
    pub quantity_required: i64,
}

/// A recipe line joined with the ingredient's live stock, as read by the
/// availability sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RecipeRequirement {
    pub ingredient_id: String,
    pub ingredient_name: String,
    pub quantity_required: i64,
    pub current_stock: i64,
}

impl RecipeRequirement {
    /// Whether one unit of the product can be produced from this line.
    #[inline]
    pub fn producible(&self) -> bool {
        self.current_stock >= self.quantity_required
    }
}

// =============================================================================
// Notification Outbox
// =============================================================================

/// An entry in the customer notification outbox.
///
/// Written best-effort after a customer-visible status transition commits;
/// delivery consumers poll and mark rows delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct NotificationOutboxEntry {
    pub id: String,
    pub order_id: String,
    pub status: OrderStatus,
    pub message: String,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Hydrated Read Model
// =============================================================================

/// An order with everything the read API nests under it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payments: Vec<Payment>,
    pub table: Option<DiningTable>,
}

impl OrderDetail {
    /// Sum of completed payment amounts.
    pub fn paid_total(&self) -> Money {
        let minor = self
            .payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Completed)
            .map(|p| p.amount)
            .sum();
        Money::from_minor(minor)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient(current: i64, minimum: i64) -> Ingredient {
        Ingredient {
            id: "ing-1".to_string(),
            name: "Flour".to_string(),
            unit: "g".to_string(),
            current_stock: current,
            minimum_stock: minimum,
            maximum_stock: 10_000,
            unit_cost: 4,
            supplier: None,
            is_active: true,
            last_restocked_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_ingredient_status_is_derived() {
        assert_eq!(ingredient(0, 100).status(), IngredientStatus::Out);
        assert_eq!(ingredient(50, 100).status(), IngredientStatus::Low);
        assert_eq!(ingredient(100, 100).status(), IngredientStatus::Ok);
        assert_eq!(ingredient(500, 100).status(), IngredientStatus::Ok);
    }

    #[test]
    fn test_ingredient_total_value() {
        assert_eq!(ingredient(250, 100).total_value(), 1_000);
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!(PaymentMethod::parse("cash"), Some(PaymentMethod::Cash));
        assert_eq!(
            PaymentMethod::parse("digital_wallet"),
            Some(PaymentMethod::DigitalWallet)
        );
        assert_eq!(PaymentMethod::parse("bitcoin"), None);
        assert_eq!(PaymentMethod::parse(""), None);
    }

    #[test]
    fn test_stock_reason_parse() {
        assert_eq!(StockReason::parse("purchase"), Some(StockReason::Purchase));
        assert_eq!(
            StockReason::parse("manual_adjustment"),
            Some(StockReason::ManualAdjustment)
        );
        assert_eq!(StockReason::parse("shrinkage"), None);
    }

    #[test]
    fn test_recipe_requirement_producible() {
        let line = RecipeRequirement {
            ingredient_id: "ing-1".to_string(),
            ingredient_name: "Flour".to_string(),
            quantity_required: 200,
            current_stock: 199,
        };
        assert!(!line.producible());

        let line = RecipeRequirement {
            current_stock: 200,
            ..line
        };
        assert!(line.producible());
    }
}

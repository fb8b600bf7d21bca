//! # comanda-core: Pure Business Logic for Comanda
//!
//! This crate is the **heart** of the Comanda order backend. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Comanda Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              POS Frontend  /  Customer QR Frontend              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               comanda-engine (transactional engines)            │   │
//! │  │   OrderEngine, PaymentEngine, StockEngine, CustomerGateway      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ comanda-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  status   │  │ validation│  │   │
//! │  │   │   Order   │  │   Money   │  │ lifecycle │  │   rules   │  │   │
//! │  │   │  Payment  │  │  TaxRate  │  │  machine  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    comanda-db (Database Layer)                  │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, Payment, Ingredient, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`status`] - Order lifecycle state machine
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in minor units (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod status;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use comanda_core::Money` instead of
// `use comanda_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::{Money, TaxRate};
pub use status::OrderStatus;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tax rate in basis points: 1100 bps = 11%.
///
/// ## Why a constant?
/// The live rate is read from the settings store at order time; this value
/// is the fallback whenever the settings row is missing or unparseable.
pub const DEFAULT_TAX_RATE_BPS: u32 = 1_100;

/// Maximum line items allowed in a single order submission.
///
/// ## Business Reason
/// Prevents runaway submissions and ensures reasonable ticket sizes.
pub const MAX_ORDER_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Hard upper bound for a single staff payment, in minor units.
///
/// ## Business Reason
/// Fraud guard: a single tender above this is far outside any plausible
/// ticket and is rejected outright rather than flagged.
pub const MAX_PAYMENT_AMOUNT: i64 = 100_000_000;

/// Newest-first cap on ingredient history reads.
pub const INGREDIENT_HISTORY_LIMIT: u32 = 100;

//! # comanda-engine: Transactional Engines for Comanda
//!
//! The consistency layer between callers and the store. Every
//! multi-statement mutation in this crate runs inside one SQLite write
//! transaction; SQLite's single-writer lock is the serialization
//! mechanism, so there are no in-process locks around business state.
//!
//! ## Engines
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        comanda-engine                                   │
//! │                                                                         │
//! │  ┌──────────────┐   ┌────────────────┐   ┌──────────────────────────┐  │
//! │  │ OrderEngine  │   │ PaymentEngine  │   │ StockEngine              │  │
//! │  │ create/status│   │ reconciliation │   │ audited adjustments      │  │
//! │  └──────┬───────┘   └───────┬────────┘   └───────────┬──────────────┘  │
//! │         │                   │                        │                 │
//! │  ┌──────▼───────────────────▼─────┐   ┌──────────────▼──────────────┐  │
//! │  │ CustomerGateway                │   │ AvailabilityEngine          │  │
//! │  │ QR tokens, rate limits,        │   │ recipe-driven product       │  │
//! │  │ sanitization, reuses engines   │   │ availability sync           │  │
//! │  └────────────────────────────────┘   └─────────────────────────────┘  │
//! │                                                                         │
//! │  settings: tax policy    notify: best-effort outbox    error: reasons  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rejections carry a stable [`ReasonCode`] so callers can distinguish
//! "retry is useless" from "retry later" from "retry now".

// =============================================================================
// Module Declarations
// =============================================================================

pub mod availability;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod order;
pub mod payment;
pub mod settings;
pub mod stock;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use availability::{AvailabilityEngine, Shortfall, SyncReport};
pub use error::{EngineError, EngineResult, ErrorCategory, ReasonCode};
pub use gateway::rate_limit::{MemoryRateLimiter, RateLimitStore};
pub use gateway::token::{MemoryTokenStore, TokenStore};
pub use gateway::{
    CustomerGateway, CustomerItemRequest, CustomerOrderRequest, CustomerPaymentRequest,
    IssuedSession,
};
pub use order::{CreateOrderRequest, OrderEngine, OrderItemRequest};
pub use payment::{PaymentEngine, PaymentOutcome, PaymentRequest};
pub use settings::{TaxPolicy, TAX_RATE_KEY};
pub use stock::{IngredientView, StockAdjustment, StockEngine};

//! # comanda-db: Database Layer for Comanda
//!
//! This crate provides database access for the Comanda order backend.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Comanda Data Flow                                │
//! │                                                                         │
//! │  Engine call (create_order, record_payment, adjust_stock)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     comanda-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (order.rs,   │    │  (embedded)  │  │   │
//! │  │   │               │    │   payment.rs, │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│   ...)        │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode, foreign keys on)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transaction Convention
//!
//! Repository methods come in two flavors:
//! - Pool-based reads (`&self`, run on their own connection)
//! - `*_tx` write helpers taking `&mut SqliteConnection`, so the engines in
//!   comanda-engine can compose several writes into a single transaction
//!   (order + items + table occupation, payment + completion + release,
//!   stock + audit row). The transaction is the sole serialization
//!   mechanism; there are no in-process locks.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::ingredient::IngredientRepository;
pub use repository::order::OrderRepository;
pub use repository::outbox::NotificationOutboxRepository;
pub use repository::payment::PaymentRepository;
pub use repository::product::ProductRepository;
pub use repository::settings::SettingsRepository;
pub use repository::table::TableRepository;

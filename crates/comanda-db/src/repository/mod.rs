//! # Repository Module
//!
//! Repository implementations for database operations.
//!
//! ## Repository Pattern
//! Each repository:
//! - Owns a clone of the connection pool for standalone reads
//! - Exposes `*_tx` associated functions taking `&mut SqliteConnection`
//!   for writes that must share a transaction with other writes
//! - Returns `DbResult<T>` for consistent error handling
//!
//! ## Available Repositories
//! - [`product::ProductRepository`] - Catalog reads, availability flag
//! - [`table::TableRepository`] - Dining tables and occupancy
//! - [`order::OrderRepository`] - Orders, items, status history
//! - [`payment::PaymentRepository`] - Payments and completed totals
//! - [`ingredient::IngredientRepository`] - Ingredients, audit trail, recipes
//! - [`settings::SettingsRepository`] - Key/value settings store
//! - [`outbox::NotificationOutboxRepository`] - Customer notification queue

pub mod ingredient;
pub mod order;
pub mod outbox;
pub mod payment;
pub mod product;
pub mod settings;
pub mod table;

//! # Order Repository
//!
//! Database operations for orders, line items and status history.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Persistence                                 │
//! │                                                                         │
//! │  1. CREATE (one transaction, order engine)                             │
//! │     ├── insert_order_tx() → header with frozen totals                  │
//! │     ├── insert_item_tx()  → one row per line, price frozen             │
//! │     └── (dine-in) table marked occupied                                │
//! │                                                                         │
//! │  2. TRANSITIONS (one transaction each)                                 │
//! │     ├── update_status_tx() → status + served_at/completed_at stamps    │
//! │     ├── insert_status_history_tx() → append-only audit row             │
//! │     └── (terminal) table released                                      │
//! │                                                                         │
//! │  3. NEVER DELETED - audit requirement                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use comanda_core::{Order, OrderItem, OrderItemStatus, OrderStatus, OrderStatusChange};

const ORDER_COLUMNS: &str = "id, table_id, user_id, customer_name, order_type, status, \
                             subtotal, tax_amount, discount_amount, total_amount, notes, \
                             created_at, updated_at, served_at, completed_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, name_snapshot, quantity, unit_price, \
                            total_price, special_instructions, status, created_at";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets an order inside an open transaction.
    ///
    /// The payment engine reads the order through the same write
    /// transaction that inserts the payment, so two concurrent payments
    /// cannot both observe a stale remaining balance.
    pub async fn get_by_id_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(order)
    }

    /// Gets all items for an order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY created_at, id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets the status history for an order, oldest first.
    pub async fn status_history(&self, order_id: &str) -> DbResult<Vec<OrderStatusChange>> {
        let history = sqlx::query_as::<_, OrderStatusChange>(
            "SELECT id, order_id, previous_status, new_status, changed_by, notes, created_at \
             FROM order_status_history WHERE order_id = ?1 ORDER BY created_at, id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(history)
    }

    // =========================================================================
    // Transactional writes
    // =========================================================================

    /// Inserts an order header inside an open transaction.
    pub async fn insert_order_tx(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, total = order.total_amount, "inserting order");

        sqlx::query(
            "INSERT INTO orders (id, table_id, user_id, customer_name, order_type, status, \
             subtotal, tax_amount, discount_amount, total_amount, notes, \
             created_at, updated_at, served_at, completed_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        )
        .bind(&order.id)
        .bind(&order.table_id)
        .bind(&order.user_id)
        .bind(&order.customer_name)
        .bind(order.order_type)
        .bind(order.status)
        .bind(order.subtotal)
        .bind(order.tax_amount)
        .bind(order.discount_amount)
        .bind(order.total_amount)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.served_at)
        .bind(order.completed_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Inserts a line item inside an open transaction.
    ///
    /// ## Snapshot Pattern
    /// `name_snapshot` and `unit_price` are the product values read during
    /// the same transaction. This preserves order history even if the
    /// product changes later.
    pub async fn insert_item_tx(conn: &mut SqliteConnection, item: &OrderItem) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, name_snapshot, quantity, \
             unit_price, total_price, special_instructions, status, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&item.id)
        .bind(&item.order_id)
        .bind(&item.product_id)
        .bind(&item.name_snapshot)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total_price)
        .bind(&item.special_instructions)
        .bind(item.status)
        .bind(item.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Updates an order's status inside an open transaction.
    ///
    /// ## What This Does
    /// - Writes the new status and `updated_at`
    /// - Entering `served` stamps `served_at`
    /// - Entering `completed` stamps `completed_at`
    ///
    /// The caller is responsible for having validated the transition and
    /// for appending the matching history row in the same transaction.
    pub async fn update_status_tx(
        conn: &mut SqliteConnection,
        order_id: &str,
        new_status: OrderStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = match new_status {
            OrderStatus::Served => {
                sqlx::query(
                    "UPDATE orders SET status = ?2, updated_at = ?3, served_at = ?3 WHERE id = ?1",
                )
                .bind(order_id)
                .bind(new_status)
                .bind(now)
                .execute(conn)
                .await?
            }
            OrderStatus::Completed => {
                sqlx::query(
                    "UPDATE orders SET status = ?2, updated_at = ?3, completed_at = ?3 \
                     WHERE id = ?1",
                )
                .bind(order_id)
                .bind(new_status)
                .bind(now)
                .execute(conn)
                .await?
            }
            _ => {
                sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
                    .bind(order_id)
                    .bind(new_status)
                    .bind(now)
                    .execute(conn)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        Ok(())
    }

    /// Appends a status history row inside an open transaction.
    ///
    /// History is append-only and never edited.
    pub async fn insert_status_history_tx(
        conn: &mut SqliteConnection,
        change: &OrderStatusChange,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO order_status_history (id, order_id, previous_status, new_status, \
             changed_by, notes, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&change.id)
        .bind(&change.order_id)
        .bind(change.previous_status)
        .bind(change.new_status)
        .bind(&change.changed_by)
        .bind(&change.notes)
        .bind(change.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Item status (kitchen workflow)
    // =========================================================================

    /// Updates a single line item's kitchen status.
    pub async fn update_item_status(
        &self,
        order_id: &str,
        item_id: &str,
        status: OrderItemStatus,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE order_items SET status = ?3 WHERE id = ?2 AND order_id = ?1",
        )
        .bind(order_id)
        .bind(item_id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("OrderItem", item_id));
        }

        Ok(())
    }
}

/// Generates a new order ID.
pub fn generate_order_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new order item ID.
pub fn generate_item_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new history entry ID.
pub fn generate_history_id() -> String {
    Uuid::new_v4().to_string()
}

//! # Notification Outbox Repository
//!
//! Queue of customer-facing status notifications.
//!
//! ## Outbox Pattern
//! The order engine enqueues a row after its status transaction commits;
//! a delivery worker drains pending rows and marks them delivered or
//! failed. Enqueue failures are logged and swallowed by the caller - a
//! notification must never roll back an order transition.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use comanda_core::{NotificationOutboxEntry, OrderStatus};

const OUTBOX_COLUMNS: &str =
    "id, order_id, status, message, attempts, last_error, created_at, delivered_at";

/// Repository for the notification outbox.
#[derive(Debug, Clone)]
pub struct NotificationOutboxRepository {
    pool: SqlitePool,
}

impl NotificationOutboxRepository {
    /// Creates a new NotificationOutboxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        NotificationOutboxRepository { pool }
    }

    /// Enqueues a notification for an order status change.
    pub async fn enqueue(
        &self,
        order_id: &str,
        status: OrderStatus,
        message: &str,
    ) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(order_id, status = status.as_str(), "enqueueing notification");

        sqlx::query(
            "INSERT INTO notification_outbox (id, order_id, status, message, attempts, \
             last_error, created_at, delivered_at) \
             VALUES (?1, ?2, ?3, ?4, 0, NULL, ?5, NULL)",
        )
        .bind(&id)
        .bind(order_id)
        .bind(status)
        .bind(message)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Gets undelivered notifications, oldest first.
    pub async fn pending(&self, limit: u32) -> DbResult<Vec<NotificationOutboxEntry>> {
        let entries = sqlx::query_as::<_, NotificationOutboxEntry>(&format!(
            "SELECT {OUTBOX_COLUMNS} FROM notification_outbox \
             WHERE delivered_at IS NULL ORDER BY created_at, id LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Marks a notification delivered.
    pub async fn mark_delivered(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE notification_outbox SET delivered_at = ?2, attempts = attempts + 1 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("NotificationOutboxEntry", id));
        }

        Ok(())
    }

    /// Records a failed delivery attempt.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE notification_outbox SET attempts = attempts + 1, last_error = ?2 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("NotificationOutboxEntry", id));
        }

        Ok(())
    }

    /// Counts undelivered notifications.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notification_outbox WHERE delivered_at IS NULL",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

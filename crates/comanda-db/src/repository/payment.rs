//! # Payment Repository
//!
//! Payment rows and the completed-total aggregate the reconciliation
//! engine validates against.
//!
//! Payments are append-only: a failed attempt is recorded with status
//! `failed`, never deleted, and only `completed` rows count toward the
//! order balance.

use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::DbResult;
use comanda_core::Payment;

const PAYMENT_COLUMNS: &str = "id, order_id, method, amount, status, reference_number, \
                               processed_by, created_at, processed_at";

/// Repository for payment database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Lists all payments for an order, oldest first.
    pub async fn list_for_order(&self, order_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = ?1 ORDER BY created_at, id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Sums completed payments for an order.
    pub async fn completed_total(&self, order_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payments \
             WHERE order_id = ?1 AND status = 'completed'",
        )
        .bind(order_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Sums completed payments inside an open transaction.
    ///
    /// The reconciliation engine computes the remaining balance from this
    /// sum in the same write transaction that inserts the new payment, so
    /// concurrent payments against one order serialize instead of both
    /// passing the overpayment check.
    pub async fn completed_total_tx(conn: &mut SqliteConnection, order_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payments \
             WHERE order_id = ?1 AND status = 'completed'",
        )
        .bind(order_id)
        .fetch_one(conn)
        .await?;

        Ok(total)
    }

    /// Inserts a payment row inside an open transaction.
    pub async fn insert_tx(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO payments (id, order_id, method, amount, status, reference_number, \
             processed_by, created_at, processed_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&payment.id)
        .bind(&payment.order_id)
        .bind(payment.method)
        .bind(payment.amount)
        .bind(payment.status)
        .bind(&payment.reference_number)
        .bind(&payment.processed_by)
        .bind(payment.created_at)
        .bind(payment.processed_at)
        .execute(conn)
        .await?;

        Ok(())
    }
}

/// Generates a new payment ID.
pub fn generate_payment_id() -> String {
    Uuid::new_v4().to_string()
}

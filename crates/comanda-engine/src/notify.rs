//! # Customer Notifications
//!
//! Best-effort outbox enqueue for customer-visible status changes.
//!
//! Called after the status transaction commits. An enqueue failure is
//! logged and swallowed: the order transition already happened and a
//! missed notification must never look like a failed transition.

use tracing::warn;

use comanda_core::OrderStatus;
use comanda_db::Database;

/// Enqueues a notification for a customer-visible status.
///
/// Non-visible statuses are ignored silently.
pub async fn enqueue_status_notification(db: &Database, order_id: &str, status: OrderStatus) {
    let message = match status {
        OrderStatus::Preparing => "Your order is being prepared",
        OrderStatus::Ready => "Your order is ready",
        OrderStatus::Completed => "Your order is complete, thank you!",
        _ => return,
    };

    if let Err(err) = db.notifications().enqueue(order_id, status, message).await {
        warn!(order_id, error = %err, "failed to enqueue status notification");
    }
}

//! # Payment Reconciliation Engine
//!
//! Records payments against orders and closes fully-paid orders.
//!
//! ## Reconciliation Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   record_payment() Steps                                │
//! │                                                                         │
//! │  1. Method in the allowed set                                           │
//! │  2. Amount > 0; staff path capped by the fraud-guard maximum            │
//! │  3. Rate limit per acting identity; failure streaks logged              │
//! │  ┌──── ONE TRANSACTION (serializes payments per order) ────────────┐   │
//! │  │  4. Order exists and is not terminal                            │   │
//! │  │  5. remaining = total − Σ(completed payments)                   │   │
//! │  │     remaining ≤ 0        → ALREADY_PAID                         │   │
//! │  │     staff: amount > rem  → EXCEEDS_BALANCE                      │   │
//! │  │     customer: amount ≠ rem → AMOUNT_MISMATCH (no change-making) │   │
//! │  │  6. Insert payment row as completed                             │   │
//! │  │  7. Full payment → order completed + table released             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │  8. Return payment + new order status                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQLite's single-writer transaction is what serializes steps 5-7: two
//! concurrent payments against one order cannot both read a stale
//! remaining balance, so joint overpayment is impossible.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::error::{EngineError, EngineResult, ErrorCategory, ReasonCode};
use crate::gateway::rate_limit::{MemoryRateLimiter, RateLimitStore};
use crate::notify;
use comanda_core::validation::validate_payment_amount;
use comanda_core::{
    Actor, Money, OrderStatus, OrderStatusChange, Payment, PaymentMethod, PaymentStatus,
    ValidationError,
};
use comanda_db::repository::order::{generate_history_id, OrderRepository};
use comanda_db::repository::payment::{generate_payment_id, PaymentRepository};
use comanda_db::repository::table::TableRepository;
use comanda_db::Database;

/// Max payment attempts per identity per window.
const PAYMENT_RATE_LIMIT: u32 = 10;

/// Rate-limit window.
const PAYMENT_RATE_WINDOW: Duration = Duration::from_secs(60);

/// Consecutive failures before the streak is logged for fraud review.
const FAILURE_STREAK_THRESHOLD: u32 = 3;

// =============================================================================
// Requests / Outcomes
// =============================================================================

/// A payment submission.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub order_id: String,
    /// Method name as submitted; parsed against the allowed set.
    pub method: String,
    /// Amount in minor units.
    pub amount: i64,
    pub reference_number: Option<String>,
    /// Staff actor, or `None` on the customer self-order path.
    pub actor: Option<Actor>,
}

/// The result of a successful payment.
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub payment: Payment,
    /// Order status after this payment.
    pub order_status: OrderStatus,
    /// Whether this payment settled the order in full.
    pub fully_paid: bool,
}

// =============================================================================
// Engine
// =============================================================================

/// Records payments and reconciles order balances.
#[derive(Clone)]
pub struct PaymentEngine {
    db: Database,
    limiter: Arc<dyn RateLimitStore>,
    /// Consecutive rejection count per identity, reset on success.
    /// Visibility only: a long streak is logged, never blocked on.
    failure_streaks: Arc<Mutex<HashMap<String, u32>>>,
}

impl PaymentEngine {
    /// Creates a new PaymentEngine with the default in-memory limiter.
    pub fn new(db: Database) -> Self {
        Self::with_limiter(
            db,
            Arc::new(MemoryRateLimiter::new(
                PAYMENT_RATE_LIMIT,
                PAYMENT_RATE_WINDOW,
            )),
        )
    }

    /// Creates a PaymentEngine with an injected rate-limit store.
    pub fn with_limiter(db: Database, limiter: Arc<dyn RateLimitStore>) -> Self {
        PaymentEngine {
            db,
            limiter,
            failure_streaks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Records a payment against an order.
    ///
    /// See the module docs for the step-by-step contract. All rejections
    /// roll back the transaction completely and carry a distinct
    /// [`ReasonCode`].
    #[instrument(skip(self, request), fields(order_id = %request.order_id, amount = request.amount))]
    pub async fn record_payment(&self, request: PaymentRequest) -> EngineResult<PaymentOutcome> {
        let identity = request
            .actor
            .as_ref()
            .map(|a| a.id.clone())
            .unwrap_or_else(|| format!("customer:{}", request.order_id));

        let result = self.record_payment_inner(&request, &identity).await;
        self.track_failure_streak(&identity, &result).await;
        result
    }

    async fn record_payment_inner(
        &self,
        request: &PaymentRequest,
        identity: &str,
    ) -> EngineResult<PaymentOutcome> {
        let staff_path = request.actor.is_some();

        // Step 1: method must be in the allowed set.
        let method = PaymentMethod::parse(&request.method).ok_or_else(|| {
            EngineError::rejected(
                ReasonCode::InvalidMethod,
                format!("unknown payment method '{}'", request.method),
            )
        })?;

        // Step 2: positive amount; staff tenders have a hard maximum.
        validate_payment_amount(request.amount, staff_path).map_err(|err| match err {
            ValidationError::OutOfRange { .. } => EngineError::rejected(
                ReasonCode::AmountLimit,
                "amount exceeds the single-payment maximum",
            ),
            other => EngineError::rejected(ReasonCode::InvalidAmount, other.to_string()),
        })?;

        // Step 3: per-identity rate limit.
        if !self.limiter.check(identity).await {
            return Err(EngineError::rejected(
                ReasonCode::RateLimited,
                "too many payment attempts, retry later",
            ));
        }

        let now = Utc::now();
        // IMMEDIATE: the balance read below must run under the write
        // lock, or a concurrent payment could commit between the read
        // and the insert.
        let mut tx = self.db.begin_immediate().await?;

        // Step 4: order exists and is not terminal.
        let order = OrderRepository::get_by_id_tx(&mut *tx, &request.order_id)
            .await?
            .ok_or_else(|| {
                EngineError::rejected(
                    ReasonCode::OrderNotFound,
                    format!("order '{}' does not exist", request.order_id),
                )
            })?;

        if order.status.is_terminal() {
            return Err(EngineError::rejected(
                ReasonCode::InvalidState,
                format!("order is already {}", order.status),
            ));
        }

        // Step 5: remaining-balance math against completed payments only.
        let paid = Money::from_minor(
            PaymentRepository::completed_total_tx(&mut *tx, &request.order_id).await?,
        );
        let total = order.total();
        let remaining = total.saturating_remaining(paid);

        if remaining.is_zero() {
            return Err(EngineError::rejected(
                ReasonCode::AlreadyPaid,
                "order is already fully paid",
            ));
        }

        let amount = Money::from_minor(request.amount);
        if staff_path {
            if amount > remaining {
                return Err(EngineError::rejected(
                    ReasonCode::ExceedsBalance,
                    format!(
                        "amount {} exceeds remaining balance {}",
                        amount.minor(),
                        remaining.minor()
                    ),
                ));
            }
        } else if amount != remaining {
            // No change-making workflow on the self-order path.
            return Err(EngineError::rejected(
                ReasonCode::AmountMismatch,
                format!(
                    "amount {} does not match remaining balance {}",
                    amount.minor(),
                    remaining.minor()
                ),
            ));
        }

        // Step 6: insert as completed.
        let payment = Payment {
            id: generate_payment_id(),
            order_id: request.order_id.clone(),
            method,
            amount: amount.minor(),
            status: PaymentStatus::Completed,
            reference_number: request.reference_number.clone(),
            processed_by: request.actor.as_ref().map(|a| a.id.clone()),
            created_at: now,
            processed_at: Some(now),
        };
        PaymentRepository::insert_tx(&mut *tx, &payment).await?;

        // Step 7: full settlement closes the order in the same transaction.
        let fully_paid = paid + amount == total;
        let order_status = if fully_paid {
            let new_status = order.status.transition_to(OrderStatus::Completed)?;

            OrderRepository::update_status_tx(&mut *tx, &request.order_id, new_status, now).await?;
            OrderRepository::insert_status_history_tx(
                &mut *tx,
                &OrderStatusChange {
                    id: generate_history_id(),
                    order_id: request.order_id.clone(),
                    previous_status: order.status,
                    new_status,
                    changed_by: request.actor.as_ref().map(|a| a.id.clone()),
                    notes: Some("full payment received".to_string()),
                    created_at: now,
                },
            )
            .await?;

            if let Some(table_id) = &order.table_id {
                TableRepository::set_occupied_tx(&mut *tx, table_id, false).await?;
            }

            new_status
        } else {
            order.status
        };

        tx.commit().await?;

        info!(
            payment_id = %payment.id,
            order_id = %request.order_id,
            amount = payment.amount,
            fully_paid,
            "payment recorded"
        );

        if fully_paid {
            notify::enqueue_status_notification(&self.db, &request.order_id, order_status).await;
        }

        // Step 8: payment record plus the order's (possibly new) status.
        Ok(PaymentOutcome {
            payment,
            order_status,
            fully_paid,
        })
    }

    /// Bumps or resets the per-identity failure streak.
    ///
    /// Rejections raise visibility for fraud review once the streak
    /// crosses the threshold; they never block further attempts (the rate
    /// limiter does that).
    async fn track_failure_streak(
        &self,
        identity: &str,
        result: &EngineResult<PaymentOutcome>,
    ) {
        let mut streaks = self.failure_streaks.lock().await;
        match result {
            Ok(_) => {
                streaks.remove(identity);
            }
            Err(err) if err.category() != ErrorCategory::System => {
                let streak = streaks.entry(identity.to_string()).or_insert(0);
                *streak += 1;
                if *streak >= FAILURE_STREAK_THRESHOLD {
                    warn!(
                        identity,
                        streak = *streak,
                        code = err.code().as_str(),
                        "repeated payment failures, flagging for review"
                    );
                }
            }
            Err(_) => {}
        }
    }

    /// Lists all payments for an order, oldest first.
    pub async fn list_payments(&self, order_id: &str) -> EngineResult<Vec<Payment>> {
        Ok(self.db.payments().list_for_order(order_id).await?)
    }
}

//! # Customer Self-Order Gateway
//!
//! Unauthenticated, table-bound entry point for QR-code ordering.
//!
//! ## Trust Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Customer Gateway Guards                              │
//! │                                                                         │
//! │  Customer scans table QR                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  issue_token()  ── rate limit ── QR lookup ── 30-min table-bound token  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  submit_order() ── rate limit ── token check ── input sanitization      │
//! │       │                                        └─► OrderEngine          │
//! │       ▼                                                                 │
//! │  submit_payment() ─ rate limit ── token check ─► PaymentEngine          │
//! │                                                  (exact-match amount,   │
//! │                                                   no actor attached)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything past the guards reuses the same engines the staff surface
//! uses; the gateway adds no business rules of its own beyond binding all
//! activity to one table.

pub mod rate_limit;
pub mod token;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use crate::error::{EngineError, EngineResult, ReasonCode};
use crate::order::{CreateOrderRequest, OrderEngine, OrderItemRequest};
use crate::payment::{PaymentEngine, PaymentOutcome, PaymentRequest};
use comanda_core::validation::sanitize_customer_text;
use comanda_core::{DiningTable, OrderDetail, OrderType};
use comanda_db::Database;

use rate_limit::{MemoryRateLimiter, RateLimitStore};
use token::{MemoryTokenStore, TokenStore};

/// Max gateway requests per client per window.
const GATEWAY_RATE_LIMIT: u32 = 20;

/// Gateway rate-limit window.
const GATEWAY_RATE_WINDOW: Duration = Duration::from_secs(60);

/// Length caps applied to customer-supplied text.
const MAX_CUSTOMER_NAME_LEN: usize = 100;
const MAX_CUSTOMER_NOTES_LEN: usize = 500;

// =============================================================================
// Requests / Responses
// =============================================================================

/// A freshly issued session for a scanned table.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub table: DiningTable,
}

/// One requested line on the self-order path.
#[derive(Debug, Clone)]
pub struct CustomerItemRequest {
    pub product_id: String,
    pub quantity: i64,
    pub special_instructions: Option<String>,
}

/// A customer order submission.
#[derive(Debug, Clone)]
pub struct CustomerOrderRequest {
    /// Client identity for rate limiting (IP or device key).
    pub client_key: String,
    pub token: String,
    pub table_id: String,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<CustomerItemRequest>,
}

/// A customer payment submission.
#[derive(Debug, Clone)]
pub struct CustomerPaymentRequest {
    pub client_key: String,
    pub token: String,
    pub order_id: String,
    pub method: String,
    /// Must equal the remaining balance exactly.
    pub amount: i64,
    pub reference_number: Option<String>,
}

// =============================================================================
// Gateway
// =============================================================================

/// The customer-facing self-order surface.
#[derive(Clone)]
pub struct CustomerGateway {
    db: Database,
    orders: OrderEngine,
    payments: PaymentEngine,
    tokens: Arc<dyn TokenStore>,
    limiter: Arc<dyn RateLimitStore>,
}

impl CustomerGateway {
    /// Creates a gateway with the default in-memory stores.
    pub fn new(db: Database) -> Self {
        Self::with_stores(
            db,
            Arc::new(MemoryTokenStore::new()),
            Arc::new(MemoryRateLimiter::new(
                GATEWAY_RATE_LIMIT,
                GATEWAY_RATE_WINDOW,
            )),
        )
    }

    /// Creates a gateway with injected token and rate-limit stores.
    pub fn with_stores(
        db: Database,
        tokens: Arc<dyn TokenStore>,
        limiter: Arc<dyn RateLimitStore>,
    ) -> Self {
        CustomerGateway {
            orders: OrderEngine::new(db.clone()),
            payments: PaymentEngine::new(db.clone()),
            db,
            tokens,
            limiter,
        }
    }

    /// Issues a table-bound session token for a scanned QR code.
    #[instrument(skip(self, qr_code, client_key))]
    pub async fn issue_token(&self, qr_code: &str, client_key: &str) -> EngineResult<IssuedSession> {
        self.check_rate(client_key).await?;

        let table = self
            .db
            .tables()
            .find_by_qr_code(qr_code)
            .await?
            .ok_or_else(|| {
                EngineError::rejected(ReasonCode::TableNotFound, "unknown QR code")
            })?;

        let token = self.tokens.issue(&table.id).await;

        info!(table_id = %table.id, "customer session issued");

        Ok(IssuedSession { token, table })
    }

    /// Submits a dine-in order for the token's table.
    #[instrument(skip(self, request), fields(table_id = %request.table_id))]
    pub async fn submit_order(&self, request: CustomerOrderRequest) -> EngineResult<OrderDetail> {
        self.check_rate(&request.client_key).await?;
        self.check_token(&request.token, &request.table_id).await?;

        let customer_name = request
            .customer_name
            .as_deref()
            .map(|name| sanitize_customer_text(name, MAX_CUSTOMER_NAME_LEN))
            .filter(|name| !name.is_empty());
        let notes = request
            .notes
            .as_deref()
            .map(|notes| sanitize_customer_text(notes, MAX_CUSTOMER_NOTES_LEN))
            .filter(|notes| !notes.is_empty());

        let items = request
            .items
            .iter()
            .map(|item| OrderItemRequest {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                special_instructions: item
                    .special_instructions
                    .as_deref()
                    .map(|text| sanitize_customer_text(text, MAX_CUSTOMER_NOTES_LEN))
                    .filter(|text| !text.is_empty()),
            })
            .collect();

        self.orders
            .create_order(CreateOrderRequest {
                order_type: OrderType::DineIn,
                table_id: Some(request.table_id.clone()),
                customer_name,
                notes,
                items,
                actor: None,
            })
            .await
    }

    /// Pays for an order on the self-order path.
    ///
    /// The token must be bound to the order's table; no actor is attached,
    /// which puts the payment engine on the exact-match path.
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn submit_payment(
        &self,
        request: CustomerPaymentRequest,
    ) -> EngineResult<PaymentOutcome> {
        self.check_rate(&request.client_key).await?;

        let order = self.orders.get_order(&request.order_id).await?;
        let table_id = order.order.table_id.as_deref().ok_or_else(|| {
            EngineError::rejected(
                ReasonCode::InvalidToken,
                "order is not bound to a table session",
            )
        })?;
        self.check_token(&request.token, table_id).await?;

        self.payments
            .record_payment(PaymentRequest {
                order_id: request.order_id.clone(),
                method: request.method.clone(),
                amount: request.amount,
                reference_number: request.reference_number.clone(),
                actor: None,
            })
            .await
    }

    async fn check_rate(&self, client_key: &str) -> EngineResult<()> {
        if !self.limiter.check(client_key).await {
            return Err(EngineError::rejected(
                ReasonCode::RateLimited,
                "too many requests, retry later",
            ));
        }
        Ok(())
    }

    async fn check_token(&self, token: &str, table_id: &str) -> EngineResult<()> {
        if !self.tokens.validate(token, table_id).await {
            return Err(EngineError::rejected(
                ReasonCode::InvalidToken,
                "session token is missing, expired, or bound to another table",
            ));
        }
        Ok(())
    }
}

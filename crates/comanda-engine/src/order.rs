//! # Order Engine
//!
//! Order aggregate construction and the status lifecycle.
//!
//! ## Order Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    create_order() Flow                                  │
//! │                                                                         │
//! │  Validate input (counts, quantities, table binding, text lengths)      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Resolve tax policy (settings read, before the transaction)            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌──── ONE TRANSACTION ───────────────────────────────────────────┐    │
//! │  │  dine-in: load table, reject unknown                           │    │
//! │  │  per item: load product, reject unknown/unavailable,           │    │
//! │  │            FREEZE current price (client prices never trusted)  │    │
//! │  │  subtotal = Σ unit_price × qty                                 │    │
//! │  │  tax = round_half_up(subtotal × rate)                          │    │
//! │  │  insert header + items, mark table occupied                    │    │
//! │  └────────────────────────────────────────────────────────────────┘    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Return hydrated order                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error inside the transaction rolls everything back; there is no
//! such thing as an order header without its items.

use chrono::Utc;
use tracing::{info, instrument};

use crate::error::{EngineError, EngineResult, ReasonCode};
use crate::notify;
use crate::settings::TaxPolicy;
use comanda_core::validation::{
    validate_item_count, validate_quantity, validate_table_binding, validate_text,
};
use comanda_core::{
    Actor, Money, Order, OrderDetail, OrderItem, OrderItemStatus, OrderStatus, OrderStatusChange,
    OrderType,
};
use comanda_db::repository::order::{generate_history_id, generate_item_id, generate_order_id};
use comanda_db::repository::order::OrderRepository;
use comanda_db::repository::product::ProductRepository;
use comanda_db::repository::table::TableRepository;
use comanda_db::Database;

/// Length caps for free-text fields.
const MAX_NOTES_LEN: usize = 500;
const MAX_NAME_LEN: usize = 100;

// =============================================================================
// Requests
// =============================================================================

/// One requested line of a new order.
#[derive(Debug, Clone)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: i64,
    pub special_instructions: Option<String>,
}

/// A new order submission.
///
/// Carries no prices: the engine re-reads every product's current price
/// inside its own transaction.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub order_type: OrderType,
    pub table_id: Option<String>,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderItemRequest>,
    /// Staff actor, or `None` on the customer self-order path.
    pub actor: Option<Actor>,
}

// =============================================================================
// Engine
// =============================================================================

/// Builds order aggregates and drives the status lifecycle.
#[derive(Debug, Clone)]
pub struct OrderEngine {
    db: Database,
}

impl OrderEngine {
    /// Creates a new OrderEngine.
    pub fn new(db: Database) -> Self {
        OrderEngine { db }
    }

    /// Creates an order atomically.
    ///
    /// See the module docs for the full flow. Returns the hydrated order.
    #[instrument(skip(self, request), fields(order_type = ?request.order_type))]
    pub async fn create_order(&self, request: CreateOrderRequest) -> EngineResult<OrderDetail> {
        // Input validation runs before anything touches the store.
        validate_item_count(request.items.len()).map_err(comanda_core::CoreError::from)?;
        for item in &request.items {
            validate_quantity(item.quantity).map_err(comanda_core::CoreError::from)?;
            validate_text(
                "special_instructions",
                item.special_instructions.as_deref(),
                MAX_NOTES_LEN,
            )
            .map_err(comanda_core::CoreError::from)?;
        }
        validate_table_binding(request.order_type, request.table_id.as_deref())
            .map_err(comanda_core::CoreError::from)?;
        validate_text("notes", request.notes.as_deref(), MAX_NOTES_LEN)
            .map_err(comanda_core::CoreError::from)?;
        validate_text("customer_name", request.customer_name.as_deref(), MAX_NAME_LEN)
            .map_err(comanda_core::CoreError::from)?;

        // Settings read happens before the transaction so it doesn't
        // contend with it for a pool connection.
        let tax_policy = TaxPolicy::resolve(&self.db).await?;

        let now = Utc::now();
        let order_id = generate_order_id();

        let mut tx = self.db.begin().await?;

        // Dine-in orders must reference an existing table.
        let table_id = match request.order_type {
            OrderType::DineIn => {
                let id = request.table_id.as_deref().unwrap_or_default();
                let table = TableRepository::get_by_id_tx(&mut *tx, id)
                    .await?
                    .ok_or_else(|| {
                        EngineError::rejected(
                            ReasonCode::TableNotFound,
                            format!("table '{id}' does not exist"),
                        )
                    })?;
                Some(table.id)
            }
            _ => None,
        };

        // Freeze prices and build line items.
        let mut items = Vec::with_capacity(request.items.len());
        let mut subtotal = Money::zero();

        for line in &request.items {
            let product = ProductRepository::get_by_id_tx(&mut *tx, &line.product_id)
                .await?
                .ok_or_else(|| {
                    EngineError::rejected(
                        ReasonCode::ProductNotFound,
                        format!("product '{}' does not exist", line.product_id),
                    )
                })?;

            if !product.is_orderable() {
                return Err(EngineError::rejected(
                    ReasonCode::ProductUnavailable,
                    format!("product '{}' is not available", product.name),
                ));
            }

            let unit_price = product.price();
            let total_price = unit_price.multiply_quantity(line.quantity);
            subtotal += total_price;

            items.push(OrderItem {
                id: generate_item_id(),
                order_id: order_id.clone(),
                product_id: product.id.clone(),
                name_snapshot: product.name.clone(),
                quantity: line.quantity,
                unit_price: unit_price.minor(),
                total_price: total_price.minor(),
                special_instructions: line.special_instructions.clone(),
                status: OrderItemStatus::Pending,
                created_at: now,
            });
        }

        let tax_amount = subtotal.calculate_tax(tax_policy.rate());
        let total_amount = subtotal + tax_amount;

        let order = Order {
            id: order_id.clone(),
            table_id: table_id.clone(),
            user_id: request.actor.as_ref().map(|a| a.id.clone()),
            customer_name: request.customer_name.clone(),
            order_type: request.order_type,
            status: OrderStatus::Pending,
            subtotal: subtotal.minor(),
            tax_amount: tax_amount.minor(),
            discount_amount: 0,
            total_amount: total_amount.minor(),
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
            served_at: None,
            completed_at: None,
        };

        OrderRepository::insert_order_tx(&mut *tx, &order).await?;
        for item in &items {
            OrderRepository::insert_item_tx(&mut *tx, item).await?;
        }

        if let Some(table_id) = &table_id {
            TableRepository::set_occupied_tx(&mut *tx, table_id, true).await?;
        }

        tx.commit().await?;

        info!(
            order_id = %order.id,
            total = order.total_amount,
            items = items.len(),
            "order created"
        );

        self.get_order(&order.id).await
    }

    /// Transitions an order to a new status.
    ///
    /// ## What Happens (one transaction)
    /// 1. Transition validated against the lifecycle table
    /// 2. Status + timestamp stamps written
    /// 3. Append-only history row with the acting identity
    /// 4. Terminal status on a dine-in order releases the table
    ///
    /// After commit, customer-visible statuses enqueue a best-effort
    /// notification; enqueue failure never propagates.
    #[instrument(skip(self, actor, notes))]
    pub async fn update_status(
        &self,
        order_id: &str,
        new_status: OrderStatus,
        actor: Option<&Actor>,
        notes: Option<String>,
    ) -> EngineResult<Order> {
        let now = Utc::now();

        let mut tx = self.db.begin().await?;

        let order = OrderRepository::get_by_id_tx(&mut *tx, order_id)
            .await?
            .ok_or_else(|| {
                EngineError::rejected(
                    ReasonCode::OrderNotFound,
                    format!("order '{order_id}' does not exist"),
                )
            })?;

        order.status.transition_to(new_status)?;

        OrderRepository::update_status_tx(&mut *tx, order_id, new_status, now).await?;

        let change = OrderStatusChange {
            id: generate_history_id(),
            order_id: order_id.to_string(),
            previous_status: order.status,
            new_status,
            changed_by: actor.map(|a| a.id.clone()),
            notes,
            created_at: now,
        };
        OrderRepository::insert_status_history_tx(&mut *tx, &change).await?;

        if new_status.is_terminal() {
            if let Some(table_id) = &order.table_id {
                TableRepository::set_occupied_tx(&mut *tx, table_id, false).await?;
            }
        }

        tx.commit().await?;

        info!(
            order_id,
            from = order.status.as_str(),
            to = new_status.as_str(),
            "order status updated"
        );

        if new_status.is_customer_visible() {
            notify::enqueue_status_notification(&self.db, order_id, new_status).await;
        }

        self.require_order(order_id).await
    }

    /// Updates a single line item's kitchen status.
    pub async fn update_item_status(
        &self,
        order_id: &str,
        item_id: &str,
        status: OrderItemStatus,
    ) -> EngineResult<()> {
        self.db
            .orders()
            .update_item_status(order_id, item_id, status)
            .await
            .map_err(|err| match err {
                comanda_db::DbError::NotFound { .. } => EngineError::rejected(
                    ReasonCode::ItemNotFound,
                    format!("item '{item_id}' not found on order '{order_id}'"),
                ),
                other => EngineError::Store(other),
            })
    }

    /// Reads an order with its items, payments and table.
    pub async fn get_order(&self, order_id: &str) -> EngineResult<OrderDetail> {
        let order = self.require_order(order_id).await?;

        let items = self.db.orders().get_items(order_id).await?;
        let payments = self.db.payments().list_for_order(order_id).await?;
        let table = match &order.table_id {
            Some(table_id) => self.db.tables().get_by_id(table_id).await?,
            None => None,
        };

        Ok(OrderDetail {
            order,
            items,
            payments,
            table,
        })
    }

    /// Reads the status history for an order, oldest first.
    pub async fn status_history(&self, order_id: &str) -> EngineResult<Vec<OrderStatusChange>> {
        Ok(self.db.orders().status_history(order_id).await?)
    }

    async fn require_order(&self, order_id: &str) -> EngineResult<Order> {
        self.db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| {
                EngineError::rejected(
                    ReasonCode::OrderNotFound,
                    format!("order '{order_id}' does not exist"),
                )
            })
    }
}

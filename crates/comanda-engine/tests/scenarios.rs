//! End-to-end flows through the engines against an in-memory store.

mod common;

use common::*;

use comanda_core::{OrderStatus, OrderType, PaymentStatus, StockOperation};
use comanda_engine::{
    CreateOrderRequest, CustomerGateway, CustomerItemRequest, CustomerOrderRequest,
    CustomerPaymentRequest, OrderEngine, OrderItemRequest, PaymentEngine, PaymentRequest,
    ReasonCode, StockAdjustment, StockEngine,
};

/// Dine-in ticket at the default 11% rate: 2×285,000 + 1×195,000.
#[tokio::test]
async fn dine_in_order_freezes_prices_and_totals() {
    let db = test_db().await;
    seed_product(&db, "prod-burger", "Burger", 285_000).await;
    seed_product(&db, "prod-fries", "Fries", 195_000).await;
    seed_table(&db, "table-1", "T1", "qr-t1").await;

    let engine = OrderEngine::new(db.clone());
    let detail = engine
        .create_order(CreateOrderRequest {
            order_type: OrderType::DineIn,
            table_id: Some("table-1".to_string()),
            customer_name: Some("Ana".to_string()),
            notes: None,
            items: vec![
                OrderItemRequest {
                    product_id: "prod-burger".to_string(),
                    quantity: 2,
                    special_instructions: None,
                },
                OrderItemRequest {
                    product_id: "prod-fries".to_string(),
                    quantity: 1,
                    special_instructions: None,
                },
            ],
            actor: Some(staff()),
        })
        .await
        .unwrap();

    assert_eq!(detail.order.subtotal, 765_000);
    assert_eq!(detail.order.tax_amount, 84_150);
    assert_eq!(detail.order.total_amount, 849_150);
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert!(detail.order.amounts_consistent());

    assert_eq!(detail.items.len(), 2);
    let burger = detail
        .items
        .iter()
        .find(|i| i.product_id == "prod-burger")
        .unwrap();
    assert_eq!(burger.unit_price, 285_000);
    assert_eq!(burger.total_price, 570_000);
    assert_eq!(burger.name_snapshot, "Burger");

    let table = detail.table.unwrap();
    assert!(table.is_occupied);
}

/// Full payment against a pending order completes it and frees the table.
#[tokio::test]
async fn full_payment_completes_order_and_releases_table() {
    let db = test_db().await;
    seed_product(&db, "prod-burger", "Burger", 285_000).await;
    seed_product(&db, "prod-fries", "Fries", 195_000).await;
    seed_table(&db, "table-1", "T1", "qr-t1").await;

    let orders = OrderEngine::new(db.clone());
    let detail = orders
        .create_order(CreateOrderRequest {
            order_type: OrderType::DineIn,
            table_id: Some("table-1".to_string()),
            customer_name: None,
            notes: None,
            items: vec![
                OrderItemRequest {
                    product_id: "prod-burger".to_string(),
                    quantity: 2,
                    special_instructions: None,
                },
                OrderItemRequest {
                    product_id: "prod-fries".to_string(),
                    quantity: 1,
                    special_instructions: None,
                },
            ],
            actor: Some(staff()),
        })
        .await
        .unwrap();

    let payments = PaymentEngine::new(db.clone());
    let outcome = payments
        .record_payment(PaymentRequest {
            order_id: detail.order.id.clone(),
            method: "cash".to_string(),
            amount: 849_150,
            reference_number: None,
            actor: Some(staff()),
        })
        .await
        .unwrap();

    assert!(outcome.fully_paid);
    assert_eq!(outcome.order_status, OrderStatus::Completed);
    assert_eq!(outcome.payment.status, PaymentStatus::Completed);
    assert_eq!(outcome.payment.processed_by.as_deref(), Some("staff-1"));

    let after = orders.get_order(&detail.order.id).await.unwrap();
    assert_eq!(after.order.status, OrderStatus::Completed);
    assert!(after.order.completed_at.is_some());
    assert!(!after.table.unwrap().is_occupied);

    // Append-only history captured the settlement transition.
    let history = orders.status_history(&detail.order.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].previous_status, OrderStatus::Pending);
    assert_eq!(history[0].new_status, OrderStatus::Completed);

    // Completion is customer-visible: one notification queued.
    assert_eq!(db.notifications().count_pending().await.unwrap(), 1);
}

/// Overpayment on the staff path is rejected and nothing is written.
#[tokio::test]
async fn overpayment_rejected_with_exceeds_balance() {
    let db = test_db().await;
    seed_product(&db, "prod-burger", "Burger", 285_000).await;
    seed_product(&db, "prod-fries", "Fries", 195_000).await;

    let orders = OrderEngine::new(db.clone());
    let detail = orders
        .create_order(CreateOrderRequest {
            order_type: OrderType::Takeaway,
            table_id: None,
            customer_name: None,
            notes: None,
            items: vec![
                OrderItemRequest {
                    product_id: "prod-burger".to_string(),
                    quantity: 2,
                    special_instructions: None,
                },
                OrderItemRequest {
                    product_id: "prod-fries".to_string(),
                    quantity: 1,
                    special_instructions: None,
                },
            ],
            actor: Some(staff()),
        })
        .await
        .unwrap();

    let payments = PaymentEngine::new(db.clone());
    let err = payments
        .record_payment(PaymentRequest {
            order_id: detail.order.id.clone(),
            method: "cash".to_string(),
            amount: 900_000,
            reference_number: None,
            actor: Some(staff()),
        })
        .await
        .unwrap_err();

    assert_eq!(err.code(), ReasonCode::ExceedsBalance);

    // Order untouched, no payment row.
    let after = orders.get_order(&detail.order.id).await.unwrap();
    assert_eq!(after.order.status, OrderStatus::Pending);
    assert!(after.payments.is_empty());
}

/// A remove below zero is rejected and leaves no audit row.
#[tokio::test]
async fn stock_remove_below_zero_rejected() {
    let db = test_db().await;
    seed_ingredient(&db, "ing-flour", "Flour", 10, 5).await;

    let stock = StockEngine::new(db.clone());
    let err = stock
        .adjust(StockAdjustment {
            ingredient_id: "ing-flour".to_string(),
            operation: StockOperation::Remove,
            quantity: 15,
            reason: "spoilage".to_string(),
            notes: None,
            adjusted_by: Some("staff-1".to_string()),
        })
        .await
        .unwrap_err();

    assert_eq!(err.code(), ReasonCode::InsufficientStock);

    let view = stock.ingredient_view("ing-flour").await.unwrap();
    assert_eq!(view.ingredient.current_stock, 10);
    assert!(stock.history("ing-flour").await.unwrap().is_empty());
}

/// Customer path requires an exact amount match.
#[tokio::test]
async fn customer_payment_must_match_remaining_exactly() {
    let db = test_db().await;
    seed_product(&db, "prod-burger", "Burger", 285_000).await;
    seed_product(&db, "prod-fries", "Fries", 195_000).await;
    seed_table(&db, "table-1", "T1", "qr-t1").await;

    let gateway = CustomerGateway::new(db.clone());
    let session = gateway.issue_token("qr-t1", "client-a").await.unwrap();
    assert_eq!(session.table.id, "table-1");

    let detail = gateway
        .submit_order(CustomerOrderRequest {
            client_key: "client-a".to_string(),
            token: session.token.clone(),
            table_id: "table-1".to_string(),
            customer_name: Some("  Ana\n".to_string()),
            notes: None,
            items: vec![
                CustomerItemRequest {
                    product_id: "prod-burger".to_string(),
                    quantity: 2,
                    special_instructions: None,
                },
                CustomerItemRequest {
                    product_id: "prod-fries".to_string(),
                    quantity: 1,
                    special_instructions: None,
                },
            ],
        })
        .await
        .unwrap();

    // Sanitized name reached the order.
    assert_eq!(detail.order.customer_name.as_deref(), Some("Ana"));
    assert_eq!(detail.order.total_amount, 849_150);

    // Off by one: rejected, nothing written.
    let err = gateway
        .submit_payment(CustomerPaymentRequest {
            client_key: "client-a".to_string(),
            token: session.token.clone(),
            order_id: detail.order.id.clone(),
            method: "digital_wallet".to_string(),
            amount: 849_149,
            reference_number: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), ReasonCode::AmountMismatch);
    assert!(db
        .payments()
        .list_for_order(&detail.order.id)
        .await
        .unwrap()
        .is_empty());

    // Exact amount settles, with no actor attached.
    let outcome = gateway
        .submit_payment(CustomerPaymentRequest {
            client_key: "client-a".to_string(),
            token: session.token,
            order_id: detail.order.id.clone(),
            method: "digital_wallet".to_string(),
            amount: 849_150,
            reference_number: Some("wallet-tx-1".to_string()),
        })
        .await
        .unwrap();
    assert!(outcome.fully_paid);
    assert_eq!(outcome.payment.processed_by, None);
    assert_eq!(outcome.order_status, OrderStatus::Completed);
}

/// A token issued for one table cannot act on another.
#[tokio::test]
async fn gateway_token_is_table_bound() {
    let db = test_db().await;
    seed_product(&db, "prod-burger", "Burger", 285_000).await;
    seed_table(&db, "table-1", "T1", "qr-t1").await;
    seed_table(&db, "table-2", "T2", "qr-t2").await;

    let gateway = CustomerGateway::new(db.clone());
    let session = gateway.issue_token("qr-t1", "client-a").await.unwrap();

    let err = gateway
        .submit_order(CustomerOrderRequest {
            client_key: "client-a".to_string(),
            token: session.token,
            table_id: "table-2".to_string(),
            customer_name: None,
            notes: None,
            items: vec![CustomerItemRequest {
                product_id: "prod-burger".to_string(),
                quantity: 1,
                special_instructions: None,
            }],
        })
        .await
        .unwrap_err();

    assert_eq!(err.code(), ReasonCode::InvalidToken);
}

/// Unknown QR codes are rejected before any token is issued.
#[tokio::test]
async fn gateway_rejects_unknown_qr() {
    let db = test_db().await;
    let gateway = CustomerGateway::new(db.clone());

    let err = gateway.issue_token("qr-bogus", "client-a").await.unwrap_err();
    assert_eq!(err.code(), ReasonCode::TableNotFound);
}

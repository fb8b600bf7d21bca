//! Cross-engine invariants: payment bounds, lifecycle rules, ledger
//! replay, availability sync idempotence.

mod common;

use common::*;

use comanda_core::{OrderStatus, OrderType, StockOperation};
use comanda_engine::{
    AvailabilityEngine, CreateOrderRequest, OrderEngine, OrderItemRequest, PaymentEngine,
    PaymentRequest, ReasonCode, StockAdjustment, StockEngine, SyncReport,
};

async fn takeaway_order(db: &comanda_db::Database, total_items: i64) -> String {
    seed_product(db, "prod-item", "Item", 100_000).await;
    let orders = OrderEngine::new(db.clone());
    orders
        .create_order(CreateOrderRequest {
            order_type: OrderType::Takeaway,
            table_id: None,
            customer_name: None,
            notes: None,
            items: vec![OrderItemRequest {
                product_id: "prod-item".to_string(),
                quantity: total_items,
                special_instructions: None,
            }],
            actor: Some(staff()),
        })
        .await
        .unwrap()
        .order
        .id
}

/// Completed payments never sum above the order total, across partial
/// tenders, and the exact remainder closes the order.
#[tokio::test]
async fn partial_payments_respect_the_balance_bound() {
    let db = test_db().await;
    // 3 × 100,000 + 11% = 333,000
    let order_id = takeaway_order(&db, 3).await;
    let payments = PaymentEngine::new(db.clone());

    let first = payments
        .record_payment(PaymentRequest {
            order_id: order_id.clone(),
            method: "cash".to_string(),
            amount: 200_000,
            reference_number: None,
            actor: Some(staff()),
        })
        .await
        .unwrap();
    assert!(!first.fully_paid);
    assert_eq!(first.order_status, OrderStatus::Pending);

    // More than the 133,000 remaining is rejected.
    let err = payments
        .record_payment(PaymentRequest {
            order_id: order_id.clone(),
            method: "cash".to_string(),
            amount: 133_001,
            reference_number: None,
            actor: Some(staff()),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), ReasonCode::ExceedsBalance);

    // The exact remainder settles.
    let second = payments
        .record_payment(PaymentRequest {
            order_id: order_id.clone(),
            method: "credit_card".to_string(),
            amount: 133_000,
            reference_number: Some("card-1".to_string()),
            actor: Some(staff()),
        })
        .await
        .unwrap();
    assert!(second.fully_paid);

    let total_paid = db.payments().completed_total(&order_id).await.unwrap();
    assert_eq!(total_paid, 333_000);

    // Any further payment hits the terminal-state check.
    let err = payments
        .record_payment(PaymentRequest {
            order_id,
            method: "cash".to_string(),
            amount: 1,
            reference_number: None,
            actor: Some(staff()),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), ReasonCode::InvalidState);
}

/// The engine enforces the lifecycle table, not just the database.
#[tokio::test]
async fn status_machine_rejects_skipped_steps() {
    let db = test_db().await;
    let order_id = takeaway_order(&db, 1).await;
    let orders = OrderEngine::new(db.clone());

    // pending → ready skips confirmed/preparing.
    let err = orders
        .update_status(&order_id, OrderStatus::Ready, Some(&staff()), None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ReasonCode::InvalidState);

    // The legal chain works, and each hop leaves a history row.
    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Served,
    ] {
        orders
            .update_status(&order_id, status, Some(&staff()), None)
            .await
            .unwrap();
    }

    let history = orders.status_history(&order_id).await.unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].new_status, OrderStatus::Confirmed);
    assert_eq!(history[3].new_status, OrderStatus::Served);

    // Nothing leaves a terminal state.
    orders
        .update_status(&order_id, OrderStatus::Cancelled, Some(&staff()), None)
        .await
        .unwrap();
    let err = orders
        .update_status(&order_id, OrderStatus::Confirmed, Some(&staff()), None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ReasonCode::InvalidState);
}

/// Cancelling a dine-in order releases its table.
#[tokio::test]
async fn cancellation_releases_the_table() {
    let db = test_db().await;
    seed_product(&db, "prod-item", "Item", 100_000).await;
    seed_table(&db, "table-1", "T1", "qr-t1").await;

    let orders = OrderEngine::new(db.clone());
    let detail = orders
        .create_order(CreateOrderRequest {
            order_type: OrderType::DineIn,
            table_id: Some("table-1".to_string()),
            customer_name: None,
            notes: None,
            items: vec![OrderItemRequest {
                product_id: "prod-item".to_string(),
                quantity: 1,
                special_instructions: None,
            }],
            actor: Some(staff()),
        })
        .await
        .unwrap();
    assert!(detail.table.unwrap().is_occupied);

    orders
        .update_status(&detail.order.id, OrderStatus::Cancelled, Some(&staff()), None)
        .await
        .unwrap();

    let table = db.tables().get_by_id("table-1").await.unwrap().unwrap();
    assert!(!table.is_occupied);
}

/// Replaying the audit trail reproduces the current stock level.
#[tokio::test]
async fn ledger_replay_matches_current_stock() {
    let db = test_db().await;
    seed_ingredient(&db, "ing-flour", "Flour", 100, 20).await;
    let stock = StockEngine::new(db.clone());

    for (operation, quantity, reason) in [
        (StockOperation::Remove, 30, "sale"),
        (StockOperation::Add, 50, "purchase"),
        (StockOperation::Remove, 5, "spoilage"),
        (StockOperation::Remove, 15, "sale"),
    ] {
        stock
            .adjust(StockAdjustment {
                ingredient_id: "ing-flour".to_string(),
                operation,
                quantity,
                reason: reason.to_string(),
                notes: None,
                adjusted_by: Some("staff-1".to_string()),
            })
            .await
            .unwrap();
    }

    let view = stock.ingredient_view("ing-flour").await.unwrap();
    assert_eq!(view.ingredient.current_stock, 100);
    assert_eq!(view.total_value, 100 * 150);
    // Purchase stamped the restock time.
    assert!(view.ingredient.last_restocked_at.is_some());

    // History is newest-first; replay oldest-first from the recorded
    // starting level.
    let history = stock.history("ing-flour").await.unwrap();
    assert_eq!(history.len(), 4);

    let mut level = history.last().unwrap().previous_stock;
    for entry in history.iter().rev() {
        assert_eq!(entry.previous_stock, level);
        level = match entry.operation {
            StockOperation::Add => level + entry.quantity,
            StockOperation::Remove => level - entry.quantity,
        };
        assert_eq!(entry.new_stock, level);
    }
    assert_eq!(level, view.ingredient.current_stock);
}

/// The availability sync converges and is idempotent.
#[tokio::test]
async fn availability_sync_is_idempotent() {
    let db = test_db().await;
    seed_product(&db, "prod-cake", "Cake", 120_000).await;
    seed_product(&db, "prod-tea", "Tea", 30_000).await; // no recipe
    seed_ingredient(&db, "ing-eggs", "Eggs", 2, 6).await;
    link_recipe(&db, "prod-cake", "ing-eggs", 3).await;

    let availability = AvailabilityEngine::new(db.clone());
    let stock = StockEngine::new(db.clone());

    // 2 in stock < 3 required: first run disables the cake.
    let report = availability.sync_all_product_availability().await.unwrap();
    assert_eq!(
        report,
        SyncReport {
            checked: 1,
            updated: 1,
            enabled: 0,
            disabled: 1
        }
    );
    assert!(!availability.check_product_availability("prod-cake").await.unwrap());

    // Second run changes nothing.
    let report = availability.sync_all_product_availability().await.unwrap();
    assert_eq!(report.updated, 0);

    // Recipe-less product was never touched.
    let tea = db.products().get_by_id("prod-tea").await.unwrap().unwrap();
    assert!(tea.is_available);

    // Restock flips the cake back on.
    stock.restock("ing-eggs", 12, Some("staff-1".to_string())).await.unwrap();
    let report = availability.sync_all_product_availability().await.unwrap();
    assert_eq!(report.enabled, 1);

    let cake = db.products().get_by_id("prod-cake").await.unwrap().unwrap();
    assert!(cake.is_available);
}

/// Shortfall checks aggregate repeated ingredients across lines.
#[tokio::test]
async fn shortfall_report_aggregates_across_lines() {
    let db = test_db().await;
    seed_product(&db, "prod-cake", "Cake", 120_000).await;
    seed_product(&db, "prod-omelette", "Omelette", 80_000).await;
    seed_ingredient(&db, "ing-eggs", "Eggs", 5, 2).await;
    link_recipe(&db, "prod-cake", "ing-eggs", 3).await;
    link_recipe(&db, "prod-omelette", "ing-eggs", 2).await;

    let availability = AvailabilityEngine::new(db.clone());

    // Each line fits alone (3 ≤ 5, 2 ≤ 5) but together they need 5 + 2.
    let shortfalls = availability
        .validate_ingredient_stock(&[
            ("prod-cake".to_string(), 1),
            ("prod-omelette".to_string(), 2),
        ])
        .await
        .unwrap();

    assert_eq!(shortfalls.len(), 1);
    assert_eq!(shortfalls[0].ingredient_id, "ing-eggs");
    assert_eq!(shortfalls[0].required, 7);
    assert_eq!(shortfalls[0].available, 5);

    // Within stock: empty report.
    let ok = availability
        .validate_ingredient_stock(&[("prod-cake".to_string(), 1)])
        .await
        .unwrap();
    assert!(ok.is_empty());
}

/// A product without a recipe keeps its manually-set flag.
#[tokio::test]
async fn manual_flag_governs_recipe_less_products() {
    let db = test_db().await;
    seed_product(&db, "prod-tea", "Tea", 30_000).await;

    let availability = AvailabilityEngine::new(db.clone());
    assert!(availability
        .check_product_availability("prod-tea")
        .await
        .unwrap());

    db.products()
        .set_availability("prod-tea", false)
        .await
        .unwrap();
    assert!(!availability
        .check_product_availability("prod-tea")
        .await
        .unwrap());
}

/// Two simultaneous full payments cannot both settle an order.
///
/// Runs against a file-backed pool so the two transactions really
/// contend for SQLite's write lock rather than queuing on a single
/// pooled connection.
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_payments_serialize_per_order() {
    let path = std::env::temp_dir().join(format!("comanda-pay-{}.db", uuid::Uuid::new_v4()));
    let db = comanda_db::Database::new(comanda_db::DbConfig::new(&path).max_connections(4))
        .await
        .unwrap();

    let order_id = takeaway_order(&db, 1).await; // 100,000 + 11% = 111,000
    let payments = PaymentEngine::new(db.clone());

    let pay = |engine: PaymentEngine, order_id: String| {
        tokio::spawn(async move {
            engine
                .record_payment(PaymentRequest {
                    order_id,
                    method: "cash".to_string(),
                    amount: 111_000,
                    reference_number: None,
                    actor: Some(staff()),
                })
                .await
        })
    };

    let a = pay(payments.clone(), order_id.clone());
    let b = pay(payments.clone(), order_id.clone());
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    // Exactly one settles; the loser sees the terminal order, not a
    // store error and not a double payment.
    let err = match (a, b) {
        (Ok(_), Err(err)) | (Err(err), Ok(_)) => err,
        (Ok(_), Ok(_)) => panic!("both concurrent payments succeeded"),
        (Err(a), Err(b)) => panic!("both concurrent payments failed: {a}, {b}"),
    };
    assert!(matches!(
        err.code(),
        ReasonCode::InvalidState | ReasonCode::AlreadyPaid
    ));

    assert_eq!(
        db.payments().completed_total(&order_id).await.unwrap(),
        111_000
    );
    let order = db.orders().get_by_id(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);

    db.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}

/// Unavailable products cannot be ordered.
#[tokio::test]
async fn unavailable_product_rejected_at_order_time() {
    let db = test_db().await;
    seed_product(&db, "prod-cake", "Cake", 120_000).await;
    seed_ingredient(&db, "ing-eggs", "Eggs", 0, 6).await;
    link_recipe(&db, "prod-cake", "ing-eggs", 3).await;

    AvailabilityEngine::new(db.clone())
        .sync_all_product_availability()
        .await
        .unwrap();

    let orders = OrderEngine::new(db.clone());
    let err = orders
        .create_order(CreateOrderRequest {
            order_type: OrderType::Takeaway,
            table_id: None,
            customer_name: None,
            notes: None,
            items: vec![OrderItemRequest {
                product_id: "prod-cake".to_string(),
                quantity: 1,
                special_instructions: None,
            }],
            actor: Some(staff()),
        })
        .await
        .unwrap_err();

    assert_eq!(err.code(), ReasonCode::ProductUnavailable);
}

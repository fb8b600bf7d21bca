//! Shared fixtures for the engine integration tests.

use chrono::Utc;
use comanda_core::{Actor, DiningTable, Ingredient, Product};
use comanda_db::{Database, DbConfig};

/// Fresh in-memory database with migrations applied.
pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

pub fn staff() -> Actor {
    Actor {
        id: "staff-1".to_string(),
        role: "server".to_string(),
    }
}

pub async fn seed_product(db: &Database, id: &str, name: &str, price: i64) -> Product {
    let now = Utc::now();
    let product = Product {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        price,
        is_available: true,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.expect("seed product");
    product
}

pub async fn seed_table(db: &Database, id: &str, number: &str, qr_code: &str) -> DiningTable {
    let now = Utc::now();
    let table = DiningTable {
        id: id.to_string(),
        table_number: number.to_string(),
        seating_capacity: 4,
        location: None,
        is_occupied: false,
        qr_code: Some(qr_code.to_string()),
        created_at: now,
        updated_at: now,
    };
    db.tables().insert(&table).await.expect("seed table");
    table
}

pub async fn seed_ingredient(
    db: &Database,
    id: &str,
    name: &str,
    current_stock: i64,
    minimum_stock: i64,
) -> Ingredient {
    let now = Utc::now();
    let ingredient = Ingredient {
        id: id.to_string(),
        name: name.to_string(),
        unit: "g".to_string(),
        current_stock,
        minimum_stock,
        maximum_stock: 100_000,
        unit_cost: 150,
        supplier: None,
        is_active: true,
        last_restocked_at: None,
        created_at: now,
        updated_at: now,
    };
    db.ingredients()
        .insert(&ingredient)
        .await
        .expect("seed ingredient");
    ingredient
}

pub async fn link_recipe(db: &Database, product_id: &str, ingredient_id: &str, quantity: i64) {
    db.ingredients()
        .insert_recipe_line(product_id, ingredient_id, quantity)
        .await
        .expect("seed recipe line");
}

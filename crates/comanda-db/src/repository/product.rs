//! # Product Repository
//!
//! Catalog reads for the order path plus the availability flag writes
//! driven by the ingredient availability sync.
//!
//! The order engine re-reads every product's current price inside its own
//! transaction; client-submitted prices never reach this layer.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use comanda_core::Product;

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, is_available, is_active, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product inside an open transaction.
    ///
    /// Used by the order engine so the price it freezes into line items is
    /// the price visible to the same transaction that writes them.
    pub async fn get_by_id_tx(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(product)
    }

    /// Lists active products.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Flips the availability flag.
    ///
    /// ## Returns
    /// Number of rows changed (0 when the flag already had that value or
    /// the product doesn't exist) - the availability sync uses this to
    /// count actual updates.
    pub async fn set_availability(&self, id: &str, available: bool) -> DbResult<u64> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET is_available = ?2, updated_at = ?3 \
             WHERE id = ?1 AND is_available <> ?2",
        )
        .bind(id)
        .bind(available)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Inserts a product (seeding and tests; catalog admin lives elsewhere).
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "inserting product");

        sqlx::query(
            "INSERT INTO products (id, name, description, price, is_available, is_active, \
             created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.is_available)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

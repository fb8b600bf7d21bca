//! # Ingredient Repository
//!
//! Ingredient stock, the append-only adjustment audit trail, and the
//! product/ingredient recipe links that drive availability sync.
//!
//! ## Audit Trail Invariant
//! Every stock mutation writes exactly one `ingredient_history` row in the
//! same transaction, carrying the previous and new levels. Replaying the
//! history from any starting point reproduces the current level.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use comanda_core::{
    Ingredient, IngredientHistoryEntry, RecipeRequirement, INGREDIENT_HISTORY_LIMIT,
};

const INGREDIENT_COLUMNS: &str = "id, name, unit, current_stock, minimum_stock, maximum_stock, \
                                  unit_cost, supplier, is_active, last_restocked_at, \
                                  created_at, updated_at";

/// Repository for ingredient database operations.
#[derive(Debug, Clone)]
pub struct IngredientRepository {
    pool: SqlitePool,
}

impl IngredientRepository {
    /// Creates a new IngredientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        IngredientRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an ingredient by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Ingredient>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ingredient)
    }

    /// Gets an ingredient inside an open transaction.
    pub async fn get_by_id_tx(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Ingredient>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(ingredient)
    }

    /// Lists active ingredients ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<Ingredient>> {
        let ingredients = sqlx::query_as::<_, Ingredient>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE is_active = 1 ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(ingredients)
    }

    /// Gets the adjustment history for an ingredient, newest first.
    ///
    /// Capped at [`INGREDIENT_HISTORY_LIMIT`] entries.
    pub async fn history(&self, ingredient_id: &str) -> DbResult<Vec<IngredientHistoryEntry>> {
        let entries = sqlx::query_as::<_, IngredientHistoryEntry>(
            "SELECT id, ingredient_id, operation, quantity, previous_stock, new_stock, \
             reason, notes, adjusted_by, created_at \
             FROM ingredient_history WHERE ingredient_id = ?1 \
             ORDER BY created_at DESC, id DESC LIMIT ?2",
        )
        .bind(ingredient_id)
        .bind(INGREDIENT_HISTORY_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    // =========================================================================
    // Recipes
    // =========================================================================

    /// Gets the recipe requirements for a product, joined with the current
    /// stock of each linked ingredient.
    ///
    /// A product with no rows here has no recipe and is always producible
    /// from a stock standpoint.
    pub async fn recipe_for_product(&self, product_id: &str) -> DbResult<Vec<RecipeRequirement>> {
        let requirements = sqlx::query_as::<_, RecipeRequirement>(
            "SELECT pi.ingredient_id, i.name AS ingredient_name, \
             pi.quantity_required, i.current_stock \
             FROM product_ingredients pi \
             JOIN ingredients i ON i.id = pi.ingredient_id \
             WHERE pi.product_id = ?1 AND i.is_active = 1 \
             ORDER BY i.name",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requirements)
    }

    /// Lists the IDs of all products that have at least one recipe line.
    ///
    /// The availability sync walks exactly this set; products without
    /// recipes are never touched by it.
    pub async fn products_with_recipes(&self) -> DbResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT product_id FROM product_ingredients ORDER BY product_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Links an ingredient to a product's recipe.
    pub async fn insert_recipe_line(
        &self,
        product_id: &str,
        ingredient_id: &str,
        quantity_required: i64,
    ) -> DbResult<()> {
        debug!(product_id, ingredient_id, quantity_required, "linking recipe line");

        sqlx::query(
            "INSERT INTO product_ingredients (id, product_id, ingredient_id, quantity_required) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(product_id)
        .bind(ingredient_id)
        .bind(quantity_required)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Transactional writes
    // =========================================================================

    /// Writes a new stock level inside an open transaction.
    ///
    /// The stock engine has already computed and validated the new level
    /// from the same transaction's read; this only persists it.
    pub async fn set_stock_tx(
        conn: &mut SqliteConnection,
        id: &str,
        new_stock: i64,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE ingredients SET current_stock = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(new_stock)
        .bind(now)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Ingredient", id));
        }

        Ok(())
    }

    /// Stamps `last_restocked_at` inside an open transaction.
    ///
    /// Called only for restock-reason additions, in the same transaction
    /// as the stock write.
    pub async fn stamp_restocked_tx(
        conn: &mut SqliteConnection,
        id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query("UPDATE ingredients SET last_restocked_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Appends an audit trail row inside an open transaction.
    pub async fn insert_history_tx(
        conn: &mut SqliteConnection,
        entry: &IngredientHistoryEntry,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO ingredient_history (id, ingredient_id, operation, quantity, \
             previous_stock, new_stock, reason, notes, adjusted_by, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&entry.id)
        .bind(&entry.ingredient_id)
        .bind(entry.operation)
        .bind(entry.quantity)
        .bind(entry.previous_stock)
        .bind(entry.new_stock)
        .bind(entry.reason)
        .bind(&entry.notes)
        .bind(&entry.adjusted_by)
        .bind(entry.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Inserts an ingredient (seeding and tests).
    pub async fn insert(&self, ingredient: &Ingredient) -> DbResult<()> {
        debug!(id = %ingredient.id, name = %ingredient.name, "inserting ingredient");

        sqlx::query(
            "INSERT INTO ingredients (id, name, unit, current_stock, minimum_stock, \
             maximum_stock, unit_cost, supplier, is_active, last_restocked_at, \
             created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&ingredient.id)
        .bind(&ingredient.name)
        .bind(&ingredient.unit)
        .bind(ingredient.current_stock)
        .bind(ingredient.minimum_stock)
        .bind(ingredient.maximum_stock)
        .bind(ingredient.unit_cost)
        .bind(&ingredient.supplier)
        .bind(ingredient.is_active)
        .bind(ingredient.last_restocked_at)
        .bind(ingredient.created_at)
        .bind(ingredient.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Generates a new ingredient ID.
pub fn generate_ingredient_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new history entry ID.
pub fn generate_history_id() -> String {
    Uuid::new_v4().to_string()
}

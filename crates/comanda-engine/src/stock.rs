//! # Stock Ledger Engine
//!
//! Ingredient stock adjustments with a mandatory audit trail.
//!
//! ## Ledger Invariant
//! Every adjustment writes the new stock level AND exactly one history row
//! in the same transaction, carrying the previous and new levels. Replaying
//! the history from any starting point reproduces the current level; a
//! rejected adjustment leaves neither.

use chrono::Utc;
use tracing::{info, instrument};

use crate::error::{EngineError, EngineResult, ReasonCode};
use comanda_core::{
    CoreError, Ingredient, IngredientHistoryEntry, IngredientStatus, StockOperation, StockReason,
};
use comanda_db::repository::ingredient::{generate_history_id, IngredientRepository};
use comanda_db::Database;

// =============================================================================
// Requests / Views
// =============================================================================

/// A stock adjustment submission.
#[derive(Debug, Clone)]
pub struct StockAdjustment {
    pub ingredient_id: String,
    pub operation: StockOperation,
    /// Base units to add or remove; must be positive.
    pub quantity: i64,
    /// Reason name as submitted; parsed against the enumeration.
    pub reason: String,
    pub notes: Option<String>,
    pub adjusted_by: Option<String>,
}

/// An ingredient with its derived fields, as exposed outward.
#[derive(Debug, Clone)]
pub struct IngredientView {
    pub ingredient: Ingredient,
    pub status: IngredientStatus,
    /// `current_stock × unit_cost`, minor units.
    pub total_value: i64,
}

// =============================================================================
// Engine
// =============================================================================

/// Applies audited stock adjustments.
#[derive(Debug, Clone)]
pub struct StockEngine {
    db: Database,
}

impl StockEngine {
    /// Creates a new StockEngine.
    pub fn new(db: Database) -> Self {
        StockEngine { db }
    }

    /// Applies a stock adjustment atomically.
    ///
    /// ## Rejections
    /// - Non-positive quantity → `INVALID_QUANTITY`
    /// - Reason outside the enumeration → `INVALID_REASON`
    /// - Unknown ingredient → `INGREDIENT_NOT_FOUND`
    /// - Remove below zero → `INSUFFICIENT_STOCK` (no history row written)
    #[instrument(skip(self, adjustment), fields(ingredient_id = %adjustment.ingredient_id))]
    pub async fn adjust(&self, adjustment: StockAdjustment) -> EngineResult<Ingredient> {
        if adjustment.quantity <= 0 {
            return Err(EngineError::rejected(
                ReasonCode::InvalidQuantity,
                "adjustment quantity must be positive",
            ));
        }

        let reason = StockReason::parse(&adjustment.reason).ok_or_else(|| {
            EngineError::rejected(
                ReasonCode::InvalidReason,
                format!("unknown stock reason '{}'", adjustment.reason),
            )
        })?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        let ingredient = IngredientRepository::get_by_id_tx(&mut *tx, &adjustment.ingredient_id)
            .await?
            .ok_or_else(|| {
                EngineError::rejected(
                    ReasonCode::IngredientNotFound,
                    format!("ingredient '{}' does not exist", adjustment.ingredient_id),
                )
            })?;

        let previous_stock = ingredient.current_stock;
        let new_stock = match adjustment.operation {
            StockOperation::Add => previous_stock + adjustment.quantity,
            StockOperation::Remove => {
                if adjustment.quantity > previous_stock {
                    return Err(CoreError::InsufficientStock {
                        name: ingredient.name.clone(),
                        available: previous_stock,
                        requested: adjustment.quantity,
                    }
                    .into());
                }
                previous_stock - adjustment.quantity
            }
        };

        IngredientRepository::set_stock_tx(&mut *tx, &ingredient.id, new_stock, now).await?;

        // Restock-reason additions also stamp last_restocked_at.
        if adjustment.operation == StockOperation::Add && reason == StockReason::Purchase {
            IngredientRepository::stamp_restocked_tx(&mut *tx, &ingredient.id, now).await?;
        }

        let entry = IngredientHistoryEntry {
            id: generate_history_id(),
            ingredient_id: ingredient.id.clone(),
            operation: adjustment.operation,
            quantity: adjustment.quantity,
            previous_stock,
            new_stock,
            reason,
            notes: adjustment.notes.clone(),
            adjusted_by: adjustment.adjusted_by.clone(),
            created_at: now,
        };
        IngredientRepository::insert_history_tx(&mut *tx, &entry).await?;

        tx.commit().await?;

        info!(
            ingredient_id = %ingredient.id,
            operation = ?adjustment.operation,
            quantity = adjustment.quantity,
            previous_stock,
            new_stock,
            "stock adjusted"
        );

        self.require_ingredient(&ingredient.id).await
    }

    /// Restocks an ingredient: an `add` with the purchase reason.
    pub async fn restock(
        &self,
        ingredient_id: &str,
        quantity: i64,
        adjusted_by: Option<String>,
    ) -> EngineResult<Ingredient> {
        self.adjust(StockAdjustment {
            ingredient_id: ingredient_id.to_string(),
            operation: StockOperation::Add,
            quantity,
            reason: "purchase".to_string(),
            notes: None,
            adjusted_by,
        })
        .await
    }

    /// Reads an ingredient with its derived status and total value.
    pub async fn ingredient_view(&self, ingredient_id: &str) -> EngineResult<IngredientView> {
        let ingredient = self.require_ingredient(ingredient_id).await?;
        let status = ingredient.status();
        let total_value = ingredient.total_value();

        Ok(IngredientView {
            ingredient,
            status,
            total_value,
        })
    }

    /// Reads the adjustment history, newest first, capped at 100 entries.
    pub async fn history(&self, ingredient_id: &str) -> EngineResult<Vec<IngredientHistoryEntry>> {
        // Surface a clean not-found instead of an empty history.
        self.require_ingredient(ingredient_id).await?;
        Ok(self.db.ingredients().history(ingredient_id).await?)
    }

    async fn require_ingredient(&self, ingredient_id: &str) -> EngineResult<Ingredient> {
        self.db
            .ingredients()
            .get_by_id(ingredient_id)
            .await?
            .ok_or_else(|| {
                EngineError::rejected(
                    ReasonCode::IngredientNotFound,
                    format!("ingredient '{ingredient_id}' does not exist"),
                )
            })
    }
}

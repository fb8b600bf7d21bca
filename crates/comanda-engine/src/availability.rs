//! # Availability Engine
//!
//! Ingredient-driven product availability.
//!
//! A product linked to ingredients through recipe lines is available only
//! while every linked ingredient has at least one unit's worth of stock.
//! Products without recipes are never touched here - their availability
//! flag is manual.
//!
//! The sync is a pure reconciliation: recomputing and writing flags that
//! already match is a no-op, so running it twice in a row reports zero
//! updates the second time.

use tracing::{info, instrument};

use crate::error::{EngineError, EngineResult, ReasonCode};
use comanda_core::RecipeRequirement;
use comanda_db::Database;

// =============================================================================
// Reports
// =============================================================================

/// Result of a full availability reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Products with recipes examined.
    pub checked: usize,
    /// Products whose flag actually changed.
    pub updated: usize,
    /// Flips to available.
    pub enabled: usize,
    /// Flips to unavailable.
    pub disabled: usize,
}

/// One ingredient short of what an order needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    pub ingredient_id: String,
    pub ingredient_name: String,
    pub required: i64,
    pub available: i64,
}

// =============================================================================
// Engine
// =============================================================================

/// Keeps product availability consistent with ingredient stock.
#[derive(Debug, Clone)]
pub struct AvailabilityEngine {
    db: Database,
}

impl AvailabilityEngine {
    /// Creates a new AvailabilityEngine.
    pub fn new(db: Database) -> Self {
        AvailabilityEngine { db }
    }

    /// Whether one unit of the product can currently be produced.
    ///
    /// Products with no recipe keep their manually-set availability flag;
    /// stock has nothing to say about them.
    pub async fn check_product_availability(&self, product_id: &str) -> EngineResult<bool> {
        // Reject unknown products instead of reporting them unavailable.
        let product = self
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| {
                EngineError::rejected(
                    ReasonCode::ProductNotFound,
                    format!("product '{product_id}' does not exist"),
                )
            })?;

        let recipe = self.db.ingredients().recipe_for_product(product_id).await?;
        if recipe.is_empty() {
            return Ok(product.is_available);
        }

        Ok(recipe.iter().all(RecipeRequirement::producible))
    }

    /// Reconciles every recipe-linked product's availability flag.
    ///
    /// Idempotent: flags already matching the computed state count as
    /// checked but not updated.
    #[instrument(skip(self))]
    pub async fn sync_all_product_availability(&self) -> EngineResult<SyncReport> {
        let product_ids = self.db.ingredients().products_with_recipes().await?;
        let products = self.db.products();

        let mut report = SyncReport::default();

        for product_id in &product_ids {
            let recipe = self.db.ingredients().recipe_for_product(product_id).await?;
            let available = recipe.iter().all(RecipeRequirement::producible);

            report.checked += 1;

            let changed = products.set_availability(product_id, available).await?;
            if changed > 0 {
                report.updated += 1;
                if available {
                    report.enabled += 1;
                } else {
                    report.disabled += 1;
                }
            }
        }

        info!(
            checked = report.checked,
            updated = report.updated,
            enabled = report.enabled,
            disabled = report.disabled,
            "availability sync finished"
        );

        Ok(report)
    }

    /// Checks whether stock covers a prospective set of order lines.
    ///
    /// Requirements for the same ingredient across repeated products are
    /// aggregated before comparison, so two lines each within stock can
    /// still jointly fall short. Returns one [`Shortfall`] per lacking
    /// ingredient; an empty result means the order is producible.
    pub async fn validate_ingredient_stock(
        &self,
        items: &[(String, i64)],
    ) -> EngineResult<Vec<Shortfall>> {
        use std::collections::HashMap;

        // ingredient_id -> (name, required, available)
        let mut needed: HashMap<String, (String, i64, i64)> = HashMap::new();

        for (product_id, quantity) in items {
            let recipe = self.db.ingredients().recipe_for_product(product_id).await?;
            for line in recipe {
                let entry = needed
                    .entry(line.ingredient_id.clone())
                    .or_insert_with(|| (line.ingredient_name.clone(), 0, line.current_stock));
                entry.1 += line.quantity_required * quantity;
            }
        }

        let mut shortfalls: Vec<Shortfall> = needed
            .into_iter()
            .filter(|(_, (_, required, available))| required > available)
            .map(|(ingredient_id, (ingredient_name, required, available))| Shortfall {
                ingredient_id,
                ingredient_name,
                required,
                available,
            })
            .collect();

        shortfalls.sort_by(|a, b| a.ingredient_name.cmp(&b.ingredient_name));

        Ok(shortfalls)
    }
}

//! # Tax Policy
//!
//! Resolves the authoritative tax rate from the settings store.
//!
//! The rate is stored as a percentage string under the `tax_rate` key
//! (e.g. `"11"` or `"11.5"`). A missing or unparseable value falls back to
//! [`comanda_core::DEFAULT_TAX_RATE_BPS`] so order creation never fails on
//! a bad settings row.

use tracing::warn;

use crate::error::EngineResult;
use comanda_core::TaxRate;
use comanda_db::Database;

/// Settings key holding the tax rate percentage.
pub const TAX_RATE_KEY: &str = "tax_rate";

/// A resolved tax rate snapshot.
///
/// Resolved once per order-creation transaction; the frozen `tax_amount`
/// on the order is what later reads report, not a re-derivation.
#[derive(Debug, Clone, Copy)]
pub struct TaxPolicy {
    rate: TaxRate,
}

impl TaxPolicy {
    /// Reads the current tax rate from settings.
    pub async fn resolve(db: &Database) -> EngineResult<Self> {
        let raw = db.settings().get(TAX_RATE_KEY).await?;

        let rate = match raw.as_deref() {
            Some(value) => match TaxRate::parse_percentage(value) {
                Some(rate) => rate,
                None => {
                    warn!(value, "unparseable tax_rate setting, using default");
                    TaxRate::default()
                }
            },
            None => TaxRate::default(),
        };

        Ok(TaxPolicy { rate })
    }

    /// The resolved rate.
    pub fn rate(&self) -> TaxRate {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comanda_db::DbConfig;

    #[tokio::test]
    async fn test_default_when_missing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let policy = TaxPolicy::resolve(&db).await.unwrap();
        assert_eq!(policy.rate().bps(), comanda_core::DEFAULT_TAX_RATE_BPS);
    }

    #[tokio::test]
    async fn test_reads_settings_row() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.settings().set(TAX_RATE_KEY, "11").await.unwrap();

        let policy = TaxPolicy::resolve(&db).await.unwrap();
        assert_eq!(policy.rate().bps(), 1_100);
    }

    #[tokio::test]
    async fn test_garbage_falls_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.settings().set(TAX_RATE_KEY, "eleven").await.unwrap();

        let policy = TaxPolicy::resolve(&db).await.unwrap();
        assert_eq!(policy.rate().bps(), comanda_core::DEFAULT_TAX_RATE_BPS);
    }
}

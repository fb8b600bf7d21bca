//! # Settings Repository
//!
//! Key/value settings store. The tax engine reads `tax_rate` from here;
//! anything else (restaurant name, receipt footer) goes through the same
//! two methods.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Repository for the settings key/value store.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Gets a setting value by key.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(value)
    }

    /// Sets a setting value (insert or replace).
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        debug!(key, value, "writing setting");

        let now = Utc::now();

        sqlx::query(
            "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, \
             updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

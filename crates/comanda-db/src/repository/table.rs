//! # Dining Table Repository
//!
//! Table lookups and the occupancy flag.
//!
//! `is_occupied` is derived-but-persisted: the order engine sets it inside
//! the order creation transaction and clears it inside the transaction that
//! completes or cancels the order, so a concluded order can never leave a
//! table stuck occupied.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use comanda_core::DiningTable;

const TABLE_COLUMNS: &str = "id, table_number, seating_capacity, location, is_occupied, \
                             qr_code, created_at, updated_at";

/// Repository for dining table operations.
#[derive(Debug, Clone)]
pub struct TableRepository {
    pool: SqlitePool,
}

impl TableRepository {
    /// Creates a new TableRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TableRepository { pool }
    }

    /// Gets a table by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<DiningTable>> {
        let table = sqlx::query_as::<_, DiningTable>(&format!(
            "SELECT {TABLE_COLUMNS} FROM dining_tables WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(table)
    }

    /// Gets a table inside an open transaction.
    pub async fn get_by_id_tx(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<DiningTable>> {
        let table = sqlx::query_as::<_, DiningTable>(&format!(
            "SELECT {TABLE_COLUMNS} FROM dining_tables WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(table)
    }

    /// Looks up a table by its QR code token (customer self-order path).
    pub async fn find_by_qr_code(&self, qr_code: &str) -> DbResult<Option<DiningTable>> {
        let table = sqlx::query_as::<_, DiningTable>(&format!(
            "SELECT {TABLE_COLUMNS} FROM dining_tables WHERE qr_code = ?1"
        ))
        .bind(qr_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(table)
    }

    /// Sets the occupancy flag inside an open transaction.
    pub async fn set_occupied_tx(
        conn: &mut SqliteConnection,
        id: &str,
        occupied: bool,
    ) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            "UPDATE dining_tables SET is_occupied = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(occupied)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Inserts a table (seeding and tests; table admin lives elsewhere).
    pub async fn insert(&self, table: &DiningTable) -> DbResult<()> {
        debug!(id = %table.id, number = %table.table_number, "inserting dining table");

        sqlx::query(
            "INSERT INTO dining_tables (id, table_number, seating_capacity, location, \
             is_occupied, qr_code, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&table.id)
        .bind(&table.table_number)
        .bind(table.seating_capacity)
        .bind(&table.location)
        .bind(table.is_occupied)
        .bind(&table.qr_code)
        .bind(table.created_at)
        .bind(table.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

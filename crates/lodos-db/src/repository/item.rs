//! # Item Repository
//!
//! Database operations for the catalog.
//!
//! The cart engine only ever reads items; the management surface
//! (insert, reprice, stock adjustment) exists for the catalog screens
//! and the seed binary. Items referenced by cart lines are never deleted
//! out from under a sale.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult, EngineResult};
use lodos_core::validation::{validate_item_name, validate_price_cents};
use lodos_core::{CoreError, Item, ValidationError};

/// Fetches one catalog item. Shared with the engine, which calls it
/// inside its per-operation transaction.
pub(crate) async fn fetch_item(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
    item_id: i64,
) -> DbResult<Option<Item>> {
    let item = sqlx::query_as::<_, Item>(
        r#"
        SELECT id, name, price_cents, stock_count, created_at, updated_at
        FROM items
        WHERE id = ?1
        "#,
    )
    .bind(item_id)
    .fetch_optional(executor)
    .await?;

    Ok(item)
}

/// Repository for catalog database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Lists the whole catalog in id order.
    pub async fn list(&self) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, name, price_cents, stock_count, created_at, updated_at
            FROM items
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets an item by id.
    pub async fn get(&self, item_id: i64) -> DbResult<Option<Item>> {
        fetch_item(&self.pool, item_id).await
    }

    /// Inserts a new catalog item and returns it.
    pub async fn insert(
        &self,
        name: &str,
        price_cents: i64,
        stock_count: i64,
    ) -> EngineResult<Item> {
        let name = validate_item_name(name)?;
        validate_price_cents(price_cents)?;
        if stock_count < 0 {
            return Err(ValidationError::OutOfRange {
                field: "stock_count",
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        let now = Utc::now();

        debug!(name = %name, price_cents, "Inserting catalog item");

        let result = sqlx::query(
            r#"
            INSERT INTO items (name, price_cents, stock_count, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&name)
        .bind(price_cents)
        .bind(stock_count)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(Item {
            id: result.last_insert_rowid(),
            name,
            price_cents,
            stock_count,
            created_at: now,
            updated_at: now,
        })
    }

    /// Updates an item's unit price.
    ///
    /// Open carts pick the new price up on their next recompute; nets are
    /// always re-derived from the current catalog price.
    pub async fn update_price(&self, item_id: i64, price_cents: i64) -> EngineResult<()> {
        validate_price_cents(price_cents)?;

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE items SET price_cents = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(item_id)
        .bind(price_cents)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ItemNotFound(item_id).into());
        }

        Ok(())
    }

    /// Adjusts an item's stock count by a signed delta and returns the new
    /// count.
    ///
    /// Fails rather than letting stock go negative.
    pub async fn adjust_stock(&self, item_id: i64, delta: i64) -> EngineResult<i64> {
        let now = Utc::now();

        debug!(item_id, delta, "Adjusting stock");

        let result = sqlx::query(
            r#"
            UPDATE items SET stock_count = stock_count + ?2, updated_at = ?3
            WHERE id = ?1 AND stock_count + ?2 >= 0
            "#,
        )
        .bind(item_id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            // Distinguish a missing item from an adjustment below zero
            return match fetch_item(&self.pool, item_id).await? {
                None => Err(CoreError::ItemNotFound(item_id).into()),
                Some(_) => Err(ValidationError::OutOfRange {
                    field: "stock_count",
                    min: 0,
                    max: i64::MAX,
                }
                .into()),
            };
        }

        let stock: i64 = sqlx::query_scalar("SELECT stock_count FROM items WHERE id = ?1")
            .bind(item_id)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        Ok(stock)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

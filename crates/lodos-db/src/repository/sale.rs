//! # Sale Repository
//!
//! Read-side database operations for sales: lookups, the on-hold listing,
//! and the report export join.
//!
//! All writes to sales and cart lines go through the
//! [`SaleEngine`](crate::engine::SaleEngine) so that every mutation runs
//! inside one transaction together with its recompute.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};

use crate::error::DbResult;
use lodos_core::{CartLine, OpenSaleSummary, Sale, SaleReportRow};

/// Fetches one sale row. Shared with the engine's in-transaction flows.
pub(crate) async fn fetch_sale(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
    sale_id: &str,
) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(
        r#"
        SELECT
            id, created_at, customer_name, status,
            payment_method, payment_reference,
            total_discount_cents, total_amount_cents, finalized_at
        FROM sales
        WHERE id = ?1
        "#,
    )
    .bind(sale_id)
    .fetch_optional(executor)
    .await?;

    Ok(sale)
}

/// Repository for sale read operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by id.
    pub async fn get(&self, sale_id: &str) -> DbResult<Option<Sale>> {
        fetch_sale(&self.pool, sale_id).await
    }

    /// Returns the stored cart lines of a sale exactly as persisted, with
    /// no campaign pass.
    ///
    /// The engine's `get_cart_lines` is the cashier-facing read; this one
    /// exists for diagnostics and for callers that need the raw ledger
    /// state (an empty result for an unknown sale is indistinguishable
    /// from an empty cart here, so prefer the engine when that matters).
    pub async fn cart_lines(&self, sale_id: &str) -> DbResult<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT id, sale_id, item_id, quantity,
                   discount_bps, discount_cents, net_total_cents
            FROM cart_lines
            WHERE sale_id = ?1
            ORDER BY id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists resumable sales (open or held), oldest first.
    ///
    /// This is the "on hold" screen: every sale a cashier can pick back
    /// up. Totals shown are the last aggregated values; the cart screen
    /// recomputes on entry.
    pub async fn list_open(&self) -> DbResult<Vec<OpenSaleSummary>> {
        let sales = sqlx::query_as::<_, OpenSaleSummary>(
            r#"
            SELECT id AS sale_id, customer_name, total_amount_cents
            FROM sales
            WHERE status IN ('open', 'held')
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Joined sale/line rows for paid sales in a date range, for the
    /// reporting export.
    ///
    /// Line figures are read live from cart_lines, so the joined rows
    /// always match the stored per-sale aggregates at the time of the
    /// read. Rendering the document is the batch job's business.
    pub async fn report(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<SaleReportRow>> {
        let rows = sqlx::query_as::<_, SaleReportRow>(
            r#"
            SELECT
                s.id AS sale_id,
                s.created_at,
                s.customer_name,
                s.payment_method,
                s.payment_reference,
                s.total_amount_cents,
                i.name AS item_name,
                i.price_cents AS item_price_cents,
                ci.quantity,
                ci.net_total_cents
            FROM sales AS s
            JOIN cart_lines AS ci ON ci.sale_id = s.id
            JOIN items AS i ON i.id = ci.item_id
            WHERE s.status = 'paid'
              AND s.created_at >= ?1
              AND s.created_at < ?2
            ORDER BY s.created_at, s.id, ci.id
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
// The listing and report queries are exercised end-to-end (with real carts
// and finalized sales) in the engine tests; see crate::engine.

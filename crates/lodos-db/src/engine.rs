//! # Sale Engine
//!
//! The cart/discount/totals facade: the full boundary surface the cashier
//! screens call, one implicit transaction per operation.
//!
//! ## Control Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      SaleEngine Operations                          │
//! │                                                                     │
//! │  start_sale ──► INSERT sales (status open, zeroed totals)           │
//! │                                                                     │
//! │  add_item ────► upsert cart line (merge on repeat add)              │
//! │  remove_line ─► DELETE by (sale_id, item_id)                        │
//! │       │                                                             │
//! │       └──► refresh sale totals from stored line values              │
//! │                                                                     │
//! │  get_cart_lines / amount_due / discount_total / finalize_payment    │
//! │       │                                                             │
//! │       └──► campaign pass first: re-derive every line's discount     │
//! │            from unit_price * quantity, then aggregate into sales    │
//! │                                                                     │
//! │  cancel_sale ─► DELETE sales row (lines cascade)                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every read of the cart runs the campaign pass before returning, so
//! results always reflect the current catalog and campaign state. The
//! pass is idempotent (see [`lodos_core::discount`]) and aggregation
//! keeps `sales.total_*` equal to the sums over the sale's lines.
//!
//! ## Concurrency Contract
//! One cashier terminal mutates one sale at a time. Each operation is a
//! single read-modify-write transaction: on any failure the whole
//! operation rolls back and the store never observes a partial cart.
//! There is no optimistic-concurrency token or row versioning; two
//! callers racing on the same sale can lose updates. That is an explicit
//! constraint of this engine, not an oversight.

use chrono::Utc;
use rand::Rng;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, EngineError, EngineResult};
use crate::repository::{campaign, item, sale};
use lodos_core::discount::{price_line, select_rule};
use lodos_core::validation::{validate_customer_name, validate_line_discount, validate_quantity};
use lodos_core::{
    CartLineView, CoreError, Item, LineDiscount, Money, OpenSaleSummary, PaymentMethod, Sale,
    SaleStatus,
};

// =============================================================================
// Sale Id Generation
// =============================================================================

/// Generates a sale id in the `<epoch-seconds>-<3-digit-random>` format,
/// e.g. `1733822000-512`.
fn generate_sale_id() -> String {
    let epoch = Utc::now().timestamp();
    let suffix: u16 = rand::thread_rng().gen_range(100..=999);
    format!("{epoch}-{suffix}")
}

// =============================================================================
// In-transaction Helpers
// =============================================================================

/// Loads a sale or fails with `SaleNotFound`. An unknown id is an error,
/// never an empty result a caller could mistake for success.
async fn require_sale(conn: &mut SqliteConnection, sale_id: &str) -> EngineResult<Sale> {
    sale::fetch_sale(&mut *conn, sale_id)
        .await?
        .ok_or_else(|| EngineError::from(CoreError::SaleNotFound(sale_id.to_string())))
}

/// Rejects operations on terminal sales.
fn require_resumable(sale: &Sale, action: &'static str) -> EngineResult<()> {
    if sale.status.is_resumable() {
        Ok(())
    } else {
        Err(CoreError::InvalidSaleStatus {
            sale_id: sale.id.clone(),
            status: sale.status,
            action,
        }
        .into())
    }
}

/// Loads a catalog item or fails with `ItemNotFound`.
async fn require_item(conn: &mut SqliteConnection, item_id: i64) -> EngineResult<Item> {
    item::fetch_item(&mut *conn, item_id)
        .await?
        .ok_or_else(|| EngineError::from(CoreError::ItemNotFound(item_id)))
}

/// Re-derives every line's discount from the current catalog price and
/// campaign rules, then refreshes the sale totals.
///
/// Always starts from `unit_price * quantity`; a line the campaign table
/// no longer matches drops back to its undiscounted base. This is what
/// keeps the pass idempotent and non-compounding, and what supersedes any
/// caller-supplied first-insert discount.
async fn apply_campaigns(conn: &mut SqliteConnection, sale_id: &str) -> EngineResult<()> {
    let lines: Vec<(i64, i64, i64)> = sqlx::query_as(
        r#"
        SELECT ci.item_id, ci.quantity, i.price_cents
        FROM cart_lines AS ci
        JOIN items AS i ON i.id = ci.item_id
        WHERE ci.sale_id = ?1
        ORDER BY ci.id
        "#,
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    for (item_id, quantity, price_cents) in lines {
        let rules = campaign::rules_for_item(&mut *conn, item_id).await?;
        let pricing = price_line(
            Money::from_cents(price_cents),
            quantity,
            select_rule(&rules, quantity),
        );

        sqlx::query(
            r#"
            UPDATE cart_lines
            SET discount_bps = ?3, discount_cents = ?4, net_total_cents = ?5
            WHERE sale_id = ?1 AND item_id = ?2
            "#,
        )
        .bind(sale_id)
        .bind(item_id)
        .bind(pricing.discount_bps)
        .bind(pricing.discount.cents())
        .bind(pricing.net.cents())
        .execute(&mut *conn)
        .await?;
    }

    refresh_totals(conn, sale_id).await
}

/// Rolls the stored line values up into the sale row:
/// `total_discount_cents = Σ discount_cents`,
/// `total_amount_cents = Σ net_total_cents`.
async fn refresh_totals(conn: &mut SqliteConnection, sale_id: &str) -> EngineResult<()> {
    let (discount_sum, amount_sum): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(discount_cents), 0), COALESCE(SUM(net_total_cents), 0)
        FROM cart_lines
        WHERE sale_id = ?1
        "#,
    )
    .bind(sale_id)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        UPDATE sales SET total_discount_cents = ?2, total_amount_cents = ?3
        WHERE id = ?1
        "#,
    )
    .bind(sale_id)
    .bind(discount_sum)
    .bind(amount_sum)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// SaleEngine
// =============================================================================

/// The engine facade consumed by the (external) presentation layer.
///
/// Cloning is cheap; all clones share one pool.
#[derive(Debug, Clone)]
pub struct SaleEngine {
    pool: SqlitePool,
}

impl SaleEngine {
    /// Creates a new SaleEngine on the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        SaleEngine { pool }
    }

    // -------------------------------------------------------------------------
    // Catalog read
    // -------------------------------------------------------------------------

    /// Lists the catalog for the item grid.
    pub async fn list_items(&self) -> EngineResult<Vec<Item>> {
        Ok(item::ItemRepository::new(self.pool.clone()).list().await?)
    }

    // -------------------------------------------------------------------------
    // Sale Lifecycle
    // -------------------------------------------------------------------------

    /// Starts a new sale for a customer and returns it.
    ///
    /// Fails with a validation error when the customer name is empty or
    /// longer than 32 characters; a sale can never exist without one.
    pub async fn start_sale(&self, customer_name: &str) -> EngineResult<Sale> {
        let customer_name = validate_customer_name(customer_name)?;

        let sale = Sale {
            id: generate_sale_id(),
            created_at: Utc::now(),
            customer_name,
            status: SaleStatus::Open,
            payment_method: None,
            payment_reference: None,
            total_discount_cents: 0,
            total_amount_cents: 0,
            finalized_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, created_at, customer_name, status,
                payment_method, payment_reference,
                total_discount_cents, total_amount_cents, finalized_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&sale.id)
        .bind(sale.created_at)
        .bind(&sale.customer_name)
        .bind(sale.status)
        .bind(sale.payment_method)
        .bind(&sale.payment_reference)
        .bind(sale.total_discount_cents)
        .bind(sale.total_amount_cents)
        .bind(sale.finalized_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        info!(sale_id = %sale.id, customer = %sale.customer_name, "Sale started");
        Ok(sale)
    }

    /// Marks an open sale as held so the cashier can serve someone else.
    /// The cart persists and the sale stays in the on-hold listing.
    pub async fn hold_sale(&self, sale_id: &str) -> EngineResult<()> {
        let mut tx = self.pool.begin().await?;

        let sale = require_sale(&mut tx, sale_id).await?;
        require_resumable(&sale, "hold")?;

        sqlx::query("UPDATE sales SET status = 'held' WHERE id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(sale_id, "Sale put on hold");
        Ok(())
    }

    /// Resumes an open or held sale and returns the customer name for the
    /// cart screen header.
    pub async fn resume_sale(&self, sale_id: &str) -> EngineResult<String> {
        let mut tx = self.pool.begin().await?;

        let sale = require_sale(&mut tx, sale_id).await?;
        require_resumable(&sale, "resume")?;

        if sale.status == SaleStatus::Held {
            sqlx::query("UPDATE sales SET status = 'open' WHERE id = ?1")
                .bind(sale_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(sale_id, customer = %sale.customer_name, "Sale resumed");
        Ok(sale.customer_name)
    }

    /// Records payment and finalizes the sale.
    ///
    /// Runs a final campaign pass first so the recorded totals reflect the
    /// catalog and campaigns at the moment of payment. Only legal from
    /// open/held; finalizing an already-paid sale is rejected with
    /// `InvalidSaleStatus` rather than silently overwriting the payment.
    pub async fn finalize_payment(
        &self,
        sale_id: &str,
        method: PaymentMethod,
        reference: Option<&str>,
    ) -> EngineResult<Sale> {
        let mut tx = self.pool.begin().await?;

        let sale = require_sale(&mut tx, sale_id).await?;
        require_resumable(&sale, "finalize payment")?;

        apply_campaigns(&mut tx, sale_id).await?;

        sqlx::query(
            r#"
            UPDATE sales
            SET status = 'paid', payment_method = ?2, payment_reference = ?3, finalized_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(sale_id)
        .bind(method)
        .bind(reference)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let finalized = require_sale(&mut tx, sale_id).await?;
        tx.commit().await?;

        info!(
            sale_id,
            ?method,
            amount = %finalized.total_amount(),
            "Sale finalized"
        );
        Ok(finalized)
    }

    /// Cancels an open or held sale: the sale row and every cart line are
    /// deleted (cascade). Reads of the sale afterwards fail with
    /// `SaleNotFound`.
    pub async fn cancel_sale(&self, sale_id: &str) -> EngineResult<()> {
        self.clear_cart(sale_id).await
    }

    /// Ledger-level teardown behind [`cancel_sale`](Self::cancel_sale):
    /// removes the sale record and all of its lines in one transaction.
    pub async fn clear_cart(&self, sale_id: &str) -> EngineResult<()> {
        let mut tx = self.pool.begin().await?;

        let sale = require_sale(&mut tx, sale_id).await?;
        require_resumable(&sale, "cancel")?;

        // ON DELETE CASCADE removes the cart lines with the sale
        sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(sale_id, "Sale cancelled, cart cleared");
        Ok(())
    }

    /// Lists resumable sales (open or held) for the on-hold screen.
    pub async fn list_open_sales(&self) -> EngineResult<Vec<OpenSaleSummary>> {
        Ok(sale::SaleRepository::new(self.pool.clone())
            .list_open()
            .await?)
    }

    // -------------------------------------------------------------------------
    // Cart Ledger
    // -------------------------------------------------------------------------

    /// Adds `quantity` units of an item to a sale's cart.
    ///
    /// If a line for the item already exists its quantity is merged and
    /// its raw total grows by `quantity * unit_price`; the per-call
    /// discount is ignored on merges. On first insert the explicit
    /// discount is applied to the unit price as-is, without clamping
    /// (the next campaign pass normalizes the line and supersedes the
    /// explicit discount entirely).
    pub async fn add_item(
        &self,
        sale_id: &str,
        item_id: i64,
        quantity: i64,
        explicit: LineDiscount,
    ) -> EngineResult<()> {
        validate_quantity(quantity)?;
        validate_line_discount(&explicit)?;

        let mut tx = self.pool.begin().await?;

        let sale = require_sale(&mut tx, sale_id).await?;
        require_resumable(&sale, "add an item")?;
        let item = require_item(&mut tx, item_id).await?;

        // First-insert pricing: explicit discount off the unit price
        let unit_net = item.price().apply_percent_discount(explicit.percent_bps)
            - Money::from_cents(explicit.amount_cents);
        let first_insert_net = unit_net.multiply_quantity(quantity);

        // Merge pricing: raw base growth, discounts left to the next pass
        let merge_increment = item.price().multiply_quantity(quantity);

        sqlx::query(
            r#"
            INSERT INTO cart_lines (
                sale_id, item_id, quantity, discount_bps, discount_cents, net_total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (sale_id, item_id) DO UPDATE SET
                quantity = quantity + excluded.quantity,
                net_total_cents = net_total_cents + ?7
            "#,
        )
        .bind(sale_id)
        .bind(item_id)
        .bind(quantity)
        .bind(explicit.percent_bps)
        .bind(explicit.amount_cents * quantity)
        .bind(first_insert_net.cents())
        .bind(merge_increment.cents())
        .execute(&mut *tx)
        .await?;

        refresh_totals(&mut tx, sale_id).await?;
        tx.commit().await?;

        debug!(sale_id, item_id, quantity, "Item added to cart");
        Ok(())
    }

    /// Removes an item's line from a sale's cart, keyed by
    /// `(sale_id, item_id)`.
    ///
    /// Positional removal is deliberately not offered: indices into a
    /// re-fetched listing go stale the moment a recompute reorders or a
    /// merge collapses lines.
    pub async fn remove_line(&self, sale_id: &str, item_id: i64) -> EngineResult<()> {
        let mut tx = self.pool.begin().await?;

        let sale = require_sale(&mut tx, sale_id).await?;
        require_resumable(&sale, "remove a line")?;

        let result = sqlx::query("DELETE FROM cart_lines WHERE sale_id = ?1 AND item_id = ?2")
            .bind(sale_id)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::LineNotFound {
                sale_id: sale_id.to_string(),
                item_id,
            }
            .into());
        }

        refresh_totals(&mut tx, sale_id).await?;
        tx.commit().await?;

        debug!(sale_id, item_id, "Cart line removed");
        Ok(())
    }

    /// Returns the sale's cart lines with item names, in insertion order.
    ///
    /// Runs the campaign pass first, so the returned discounts and nets
    /// always reflect the current catalog and campaign state.
    pub async fn get_cart_lines(&self, sale_id: &str) -> EngineResult<Vec<CartLineView>> {
        let mut tx = self.pool.begin().await?;

        require_sale(&mut tx, sale_id).await?;
        apply_campaigns(&mut tx, sale_id).await?;

        let lines = sqlx::query_as::<_, CartLineView>(
            r#"
            SELECT
                ci.item_id,
                i.name AS item_name,
                ci.quantity,
                ci.discount_bps,
                ci.discount_cents,
                ci.net_total_cents
            FROM cart_lines AS ci
            JOIN items AS i ON i.id = ci.item_id
            WHERE ci.sale_id = ?1
            ORDER BY ci.id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(lines)
    }

    // -------------------------------------------------------------------------
    // Sale Aggregator
    // -------------------------------------------------------------------------

    /// Net payable for the sale: `Σ line net totals` after a fresh
    /// campaign pass (read-through recompute, never cached).
    pub async fn amount_due(&self, sale_id: &str) -> EngineResult<Money> {
        let sale = self.recomputed_sale(sale_id).await?;
        Ok(sale.total_amount())
    }

    /// Discount sum for the sale: `Σ line discounts` after a fresh
    /// campaign pass.
    pub async fn discount_total(&self, sale_id: &str) -> EngineResult<Money> {
        let sale = self.recomputed_sale(sale_id).await?;
        Ok(sale.total_discount())
    }

    /// Campaign pass + aggregation, then the freshly-written sale row.
    async fn recomputed_sale(&self, sale_id: &str) -> EngineResult<Sale> {
        let mut tx = self.pool.begin().await?;

        require_sale(&mut tx, sale_id).await?;
        apply_campaigns(&mut tx, sale_id).await?;
        let sale = require_sale(&mut tx, sale_id).await?;

        tx.commit().await?;
        Ok(sale)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use lodos_core::DiscountKind;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_item(db: &Database, name: &str, price_cents: i64) -> i64 {
        db.items().insert(name, price_cents, 100).await.unwrap().id
    }

    /// Sums the stored line values directly, bypassing the engine, to
    /// check them against the persisted sale aggregates.
    async fn stored_sums(db: &Database, sale_id: &str) -> (i64, i64) {
        let lines = db.sales().cart_lines(sale_id).await.unwrap();
        (
            lines.iter().map(|l| l.discount_cents).sum(),
            lines.iter().map(|l| l.net_total_cents).sum(),
        )
    }

    async fn assert_aggregates_consistent(db: &Database, sale_id: &str) {
        let sale = db.sales().get(sale_id).await.unwrap().unwrap();
        let (discount_sum, amount_sum) = stored_sums(db, sale_id).await;
        assert_eq!(sale.total_discount_cents, discount_sum);
        assert_eq!(sale.total_amount_cents, amount_sum);
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_start_sale_generates_epoch_random_id() {
        let db = test_db().await;
        let sale = db.engine().start_sale("ADA LOVELACE").await.unwrap();

        let (epoch, suffix) = sale.id.split_once('-').unwrap();
        assert!(epoch.parse::<i64>().unwrap() > 0);
        assert_eq!(suffix.len(), 3);
        let suffix: u32 = suffix.parse().unwrap();
        assert!((100..=999).contains(&suffix));

        assert_eq!(sale.status, SaleStatus::Open);
        assert_eq!(sale.payment_method, None);
        assert_eq!(sale.total_amount_cents, 0);
        assert_eq!(sale.total_discount_cents, 0);
    }

    #[tokio::test]
    async fn test_start_sale_rejects_bad_names() {
        let db = test_db().await;
        let engine = db.engine();

        let too_long = "A".repeat(33);
        for bad in ["", "   ", too_long.as_str()] {
            let err = engine.start_sale(bad).await.unwrap_err();
            assert!(matches!(
                err,
                EngineError::Core(CoreError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_hold_resume_flow() {
        let db = test_db().await;
        let engine = db.engine();

        let sale = engine.start_sale("GRACE HOPPER").await.unwrap();
        engine.hold_sale(&sale.id).await.unwrap();
        assert_eq!(
            db.sales().get(&sale.id).await.unwrap().unwrap().status,
            SaleStatus::Held
        );

        let name = engine.resume_sale(&sale.id).await.unwrap();
        assert_eq!(name, "GRACE HOPPER");
        assert_eq!(
            db.sales().get(&sale.id).await.unwrap().unwrap().status,
            SaleStatus::Open
        );
    }

    #[tokio::test]
    async fn test_resume_unknown_sale() {
        let db = test_db().await;
        let err = db.engine().resume_sale("1733822000-404").await.unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::SaleNotFound(_))));
    }

    #[tokio::test]
    async fn test_on_hold_listing_covers_open_and_held() {
        let db = test_db().await;
        let engine = db.engine();
        let item = seed_item(&db, "Black Tea 500g", 4500).await;

        let first = engine.start_sale("FIRST").await.unwrap();
        let second = engine.start_sale("SECOND").await.unwrap();
        engine
            .add_item(&first.id, item, 2, LineDiscount::NONE)
            .await
            .unwrap();
        engine.hold_sale(&first.id).await.unwrap();

        let open = engine.list_open_sales().await.unwrap();
        assert_eq!(open.len(), 2);
        let held = open.iter().find(|s| s.sale_id == first.id).unwrap();
        assert_eq!(held.customer_name, "FIRST");
        assert_eq!(held.total_amount_cents, 9000);

        // Paid sales leave the listing
        engine
            .finalize_payment(&second.id, PaymentMethod::Cash, None)
            .await
            .unwrap();
        let open = engine.list_open_sales().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].sale_id, first.id);
    }

    #[tokio::test]
    async fn test_finalize_sets_payment_and_rejects_second_finalize() {
        let db = test_db().await;
        let engine = db.engine();
        let item = seed_item(&db, "Filter Coffee 250g", 9900).await;

        let sale = engine.start_sale("ADA LOVELACE").await.unwrap();
        engine
            .add_item(&sale.id, item, 1, LineDiscount::NONE)
            .await
            .unwrap();

        let paid = engine
            .finalize_payment(&sale.id, PaymentMethod::BankTransfer, Some("B. ELDEM"))
            .await
            .unwrap();
        assert_eq!(paid.status, SaleStatus::Paid);
        assert_eq!(paid.payment_method, Some(PaymentMethod::BankTransfer));
        assert_eq!(paid.payment_reference.as_deref(), Some("B. ELDEM"));
        assert!(paid.finalized_at.is_some());

        // Re-finalization with a different method is rejected, not an
        // overwrite
        let err = engine
            .finalize_payment(&sale.id, PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidSaleStatus { .. })
        ));
        let sale = db.sales().get(&sale.id).await.unwrap().unwrap();
        assert_eq!(sale.payment_method, Some(PaymentMethod::BankTransfer));

        // And a paid cart no longer accepts mutations
        let err = engine
            .add_item(&sale.id, item, 1, LineDiscount::NONE)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidSaleStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancellation_cascades() {
        let db = test_db().await;
        let engine = db.engine();
        let tea = seed_item(&db, "Black Tea 500g", 4500).await;
        let coffee = seed_item(&db, "Filter Coffee 250g", 9900).await;

        let sale = engine.start_sale("ADA LOVELACE").await.unwrap();
        engine
            .add_item(&sale.id, tea, 2, LineDiscount::NONE)
            .await
            .unwrap();
        engine
            .add_item(&sale.id, coffee, 1, LineDiscount::NONE)
            .await
            .unwrap();

        engine.cancel_sale(&sale.id).await.unwrap();

        assert!(db.sales().get(&sale.id).await.unwrap().is_none());
        let (_, amount) = stored_sums(&db, &sale.id).await;
        assert_eq!(amount, 0);

        let err = engine.get_cart_lines(&sale.id).await.unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::SaleNotFound(_))));
    }

    // -------------------------------------------------------------------------
    // Cart Ledger
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_add_item_unknown_item_or_sale() {
        let db = test_db().await;
        let engine = db.engine();
        let sale = engine.start_sale("ADA LOVELACE").await.unwrap();

        let err = engine
            .add_item(&sale.id, 404, 1, LineDiscount::NONE)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::ItemNotFound(404))));

        let item = seed_item(&db, "Black Tea 500g", 4500).await;
        let err = engine
            .add_item("1733822000-404", item, 1, LineDiscount::NONE)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::SaleNotFound(_))));
    }

    #[tokio::test]
    async fn test_add_item_rejects_bad_quantity() {
        let db = test_db().await;
        let engine = db.engine();
        let item = seed_item(&db, "Black Tea 500g", 4500).await;
        let sale = engine.start_sale("ADA LOVELACE").await.unwrap();

        for qty in [0, -3, 1000] {
            assert!(engine
                .add_item(&sale.id, item, qty, LineDiscount::NONE)
                .await
                .is_err());
        }
    }

    /// Adding X qty 2 then X qty 3 yields exactly one line with quantity
    /// 5, never two rows.
    #[tokio::test]
    async fn test_merge_on_repeat_add() {
        let db = test_db().await;
        let engine = db.engine();
        let item = seed_item(&db, "Black Tea 500g", 4500).await;
        let sale = engine.start_sale("ADA LOVELACE").await.unwrap();

        engine
            .add_item(&sale.id, item, 2, LineDiscount::NONE)
            .await
            .unwrap();
        engine
            .add_item(&sale.id, item, 3, LineDiscount::NONE)
            .await
            .unwrap();

        let lines = engine.get_cart_lines(&sale.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
        assert_eq!(lines[0].net_total_cents, 5 * 4500);
        assert_aggregates_consistent(&db, &sale.id).await;
    }

    #[tokio::test]
    async fn test_remove_line_keyed_by_item() {
        let db = test_db().await;
        let engine = db.engine();
        let tea = seed_item(&db, "Black Tea 500g", 4500).await;
        let coffee = seed_item(&db, "Filter Coffee 250g", 9900).await;
        let sale = engine.start_sale("ADA LOVELACE").await.unwrap();

        engine
            .add_item(&sale.id, tea, 2, LineDiscount::NONE)
            .await
            .unwrap();
        engine
            .add_item(&sale.id, coffee, 1, LineDiscount::NONE)
            .await
            .unwrap();

        engine.remove_line(&sale.id, tea).await.unwrap();

        let lines = engine.get_cart_lines(&sale.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item_id, coffee);
        assert_eq!(
            engine.amount_due(&sale.id).await.unwrap(),
            Money::from_cents(9900)
        );

        let err = engine.remove_line(&sale.id, tea).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::LineNotFound { .. })
        ));
    }

    /// The explicit discount applies on first insert only; a merge adds
    /// the raw base, and the next campaign pass supersedes both.
    #[tokio::test]
    async fn test_explicit_discount_first_insert_then_superseded() {
        let db = test_db().await;
        let engine = db.engine();
        let item = seed_item(&db, "Black Tea 500g", 1000).await;
        let sale = engine.start_sale("ADA LOVELACE").await.unwrap();

        let ten_percent = LineDiscount {
            percent_bps: 1000,
            amount_cents: 0,
        };
        engine.add_item(&sale.id, item, 2, ten_percent).await.unwrap();

        // Raw ledger state before any campaign pass: 900 * 2
        let lines = db.sales().cart_lines(&sale.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].net_total_cents, 1800);
        assert_eq!(lines[0].discount_bps, 1000);
        assert_aggregates_consistent(&db, &sale.id).await;

        // Merge ignores the per-call discount: +1 unit adds the full 1000
        engine.add_item(&sale.id, item, 1, ten_percent).await.unwrap();
        let lines = db.sales().cart_lines(&sale.id).await.unwrap();
        assert_eq!(lines[0].quantity, 3);
        assert_eq!(lines[0].net_total_cents, 2800);

        // The campaign pass re-derives from base; with no campaign rules
        // the explicit discount is wiped entirely
        assert_eq!(
            engine.amount_due(&sale.id).await.unwrap(),
            Money::from_cents(3000)
        );
        assert_eq!(
            engine.discount_total(&sale.id).await.unwrap(),
            Money::zero()
        );
    }

    // -------------------------------------------------------------------------
    // Discounts and Aggregation
    // -------------------------------------------------------------------------

    /// 3 x 100.00 with no campaign reads undiscounted; a 10%-at-3 rule
    /// defined afterwards shows up on the very next read.
    #[tokio::test]
    async fn test_campaign_recompute_scenario() {
        let db = test_db().await;
        let engine = db.engine();
        let item = seed_item(&db, "Olive Oil 1L", 10_000).await;

        let sale = engine.start_sale("ADA LOVELACE").await.unwrap();
        engine
            .add_item(&sale.id, item, 3, LineDiscount::NONE)
            .await
            .unwrap();

        assert_eq!(
            engine.amount_due(&sale.id).await.unwrap(),
            Money::from_cents(30_000)
        );
        assert_eq!(
            engine.discount_total(&sale.id).await.unwrap(),
            Money::zero()
        );

        db.campaigns()
            .insert(item, DiscountKind::Percent, 1000, 3)
            .await
            .unwrap();

        assert_eq!(
            engine.amount_due(&sale.id).await.unwrap(),
            Money::from_cents(27_000)
        );
        assert_eq!(
            engine.discount_total(&sale.id).await.unwrap(),
            Money::from_cents(3_000)
        );
        assert_aggregates_consistent(&db, &sale.id).await;
    }

    /// The largest qualifying threshold wins even when a lower threshold
    /// would discount more.
    #[tokio::test]
    async fn test_threshold_tie_break_end_to_end() {
        let db = test_db().await;
        let engine = db.engine();
        let item = seed_item(&db, "Black Tea 500g", 1000).await;

        db.campaigns()
            .insert(item, DiscountKind::Percent, 500, 1)
            .await
            .unwrap();
        db.campaigns()
            .insert(item, DiscountKind::Fixed, 2000, 10)
            .await
            .unwrap();

        let sale = engine.start_sale("ADA LOVELACE").await.unwrap();
        engine
            .add_item(&sale.id, item, 10, LineDiscount::NONE)
            .await
            .unwrap();

        assert_eq!(
            engine.discount_total(&sale.id).await.unwrap(),
            Money::from_cents(2000)
        );
        assert_eq!(
            engine.amount_due(&sale.id).await.unwrap(),
            Money::from_cents(8000)
        );
    }

    /// A fixed discount bigger than the line clamps to the base and the
    /// net floors at zero.
    #[tokio::test]
    async fn test_fixed_discount_clamp_end_to_end() {
        let db = test_db().await;
        let engine = db.engine();
        let item = seed_item(&db, "Matches", 500).await;

        db.campaigns()
            .insert(item, DiscountKind::Fixed, 2000, 1)
            .await
            .unwrap();

        let sale = engine.start_sale("ADA LOVELACE").await.unwrap();
        engine
            .add_item(&sale.id, item, 1, LineDiscount::NONE)
            .await
            .unwrap();

        let lines = engine.get_cart_lines(&sale.id).await.unwrap();
        assert_eq!(lines[0].discount_cents, 500);
        assert_eq!(lines[0].net_total_cents, 0);
        assert_eq!(lines[0].discount_bps, 10_000);
        assert_eq!(engine.amount_due(&sale.id).await.unwrap(), Money::zero());
    }

    /// Two passes over unchanged data produce identical lines and totals;
    /// discounts never compound.
    #[tokio::test]
    async fn test_recompute_is_idempotent() {
        let db = test_db().await;
        let engine = db.engine();
        let tea = seed_item(&db, "Black Tea 500g", 4500).await;
        let coffee = seed_item(&db, "Filter Coffee 250g", 9900).await;

        db.campaigns()
            .insert(tea, DiscountKind::Percent, 750, 2)
            .await
            .unwrap();
        db.campaigns()
            .insert(coffee, DiscountKind::Fixed, 1200, 1)
            .await
            .unwrap();

        let sale = engine.start_sale("ADA LOVELACE").await.unwrap();
        engine
            .add_item(&sale.id, tea, 4, LineDiscount::NONE)
            .await
            .unwrap();
        engine
            .add_item(&sale.id, coffee, 2, LineDiscount::NONE)
            .await
            .unwrap();

        let first_lines = engine.get_cart_lines(&sale.id).await.unwrap();
        let first_due = engine.amount_due(&sale.id).await.unwrap();
        let second_lines = engine.get_cart_lines(&sale.id).await.unwrap();
        let second_due = engine.amount_due(&sale.id).await.unwrap();

        for (a, b) in first_lines.iter().zip(&second_lines) {
            assert_eq!(a.discount_bps, b.discount_bps);
            assert_eq!(a.discount_cents, b.discount_cents);
            assert_eq!(a.net_total_cents, b.net_total_cents);
        }
        assert_eq!(first_due, second_due);
        assert_aggregates_consistent(&db, &sale.id).await;
    }

    /// Aggregates stay equal to the line sums after every mutating
    /// operation, and line nets never go negative.
    #[tokio::test]
    async fn test_aggregation_consistency_through_mutations() {
        let db = test_db().await;
        let engine = db.engine();
        let tea = seed_item(&db, "Black Tea 500g", 4500).await;
        let coffee = seed_item(&db, "Filter Coffee 250g", 9900).await;

        db.campaigns()
            .insert(tea, DiscountKind::Fixed, 800, 3)
            .await
            .unwrap();

        let sale = engine.start_sale("ADA LOVELACE").await.unwrap();

        engine
            .add_item(&sale.id, tea, 2, LineDiscount::NONE)
            .await
            .unwrap();
        assert_aggregates_consistent(&db, &sale.id).await;

        engine
            .add_item(&sale.id, tea, 1, LineDiscount::NONE)
            .await
            .unwrap();
        assert_aggregates_consistent(&db, &sale.id).await;

        engine
            .add_item(&sale.id, coffee, 1, LineDiscount::NONE)
            .await
            .unwrap();
        assert_aggregates_consistent(&db, &sale.id).await;

        engine.get_cart_lines(&sale.id).await.unwrap();
        assert_aggregates_consistent(&db, &sale.id).await;

        engine.remove_line(&sale.id, coffee).await.unwrap();
        assert_aggregates_consistent(&db, &sale.id).await;

        for line in engine.get_cart_lines(&sale.id).await.unwrap() {
            assert!(line.net_total_cents >= 0);
            assert!(line.discount_cents <= 4500 * line.quantity);
        }
    }

    /// Finalization records the recomputed totals, and the report join
    /// reads back figures that match them.
    #[tokio::test]
    async fn test_finalized_totals_match_report_join() {
        let db = test_db().await;
        let engine = db.engine();
        let tea = seed_item(&db, "Black Tea 500g", 4500).await;
        let coffee = seed_item(&db, "Filter Coffee 250g", 9900).await;

        db.campaigns()
            .insert(tea, DiscountKind::Percent, 1000, 2)
            .await
            .unwrap();

        let sale = engine.start_sale("ADA LOVELACE").await.unwrap();
        engine
            .add_item(&sale.id, tea, 2, LineDiscount::NONE)
            .await
            .unwrap();
        engine
            .add_item(&sale.id, coffee, 1, LineDiscount::NONE)
            .await
            .unwrap();

        let paid = engine
            .finalize_payment(&sale.id, PaymentMethod::Cash, None)
            .await
            .unwrap();
        // 2 * 4500 - 10% = 8100, plus 9900
        assert_eq!(paid.total_amount_cents, 8100 + 9900);
        assert_eq!(paid.total_discount_cents, 900);

        let from = paid.created_at - chrono::Duration::hours(1);
        let to = paid.created_at + chrono::Duration::hours(1);
        let rows = db.sales().report(from, to).await.unwrap();

        assert_eq!(rows.len(), 2);
        let joined_net: i64 = rows.iter().map(|r| r.net_total_cents).sum();
        assert_eq!(joined_net, paid.total_amount_cents);
        assert!(rows.iter().all(|r| r.sale_id == paid.id));
        assert!(rows
            .iter()
            .all(|r| r.payment_method == Some(PaymentMethod::Cash)));
    }
}

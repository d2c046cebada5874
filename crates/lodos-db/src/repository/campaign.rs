//! # Campaign Repository
//!
//! Database operations for quantity-threshold discount rules.
//!
//! Rules are read-only during a sale: the discount pass loads the rules
//! for each cart line's item and hands them to the pure selection logic
//! in `lodos_core::discount`. Which rule wins is decided there, not in
//! SQL, so the tie-break is unit-tested without a database.

use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult, EngineResult};
use lodos_core::validation::{validate_min_quantity, validate_rule_value};
use lodos_core::{CampaignRule, DiscountKind};

/// Fetches every rule for one item. Shared with the engine's in-transaction
/// discount pass.
///
/// Ordered by threshold then id purely for stable output; selection does
/// not depend on the ordering.
pub(crate) async fn rules_for_item(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
    item_id: i64,
) -> DbResult<Vec<CampaignRule>> {
    let rules = sqlx::query_as::<_, CampaignRule>(
        r#"
        SELECT id, item_id, kind, value, min_quantity
        FROM campaign_rules
        WHERE item_id = ?1
        ORDER BY min_quantity DESC, id
        "#,
    )
    .bind(item_id)
    .fetch_all(executor)
    .await?;

    Ok(rules)
}

/// Repository for campaign rule database operations.
#[derive(Debug, Clone)]
pub struct CampaignRepository {
    pool: SqlitePool,
}

impl CampaignRepository {
    /// Creates a new CampaignRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CampaignRepository { pool }
    }

    /// Lists all rules, grouped by item.
    pub async fn list(&self) -> DbResult<Vec<CampaignRule>> {
        let rules = sqlx::query_as::<_, CampaignRule>(
            r#"
            SELECT id, item_id, kind, value, min_quantity
            FROM campaign_rules
            ORDER BY item_id, min_quantity, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rules)
    }

    /// Gets all rules for one item.
    pub async fn rules_for_item(&self, item_id: i64) -> DbResult<Vec<CampaignRule>> {
        rules_for_item(&self.pool, item_id).await
    }

    /// Inserts a new rule and returns it.
    ///
    /// `value` is basis points for percent rules and cents for fixed
    /// rules. The foreign key rejects rules for unknown items.
    pub async fn insert(
        &self,
        item_id: i64,
        kind: DiscountKind,
        value: i64,
        min_quantity: i64,
    ) -> EngineResult<CampaignRule> {
        validate_rule_value(kind, value)?;
        validate_min_quantity(min_quantity)?;

        debug!(item_id, ?kind, value, min_quantity, "Inserting campaign rule");

        let result = sqlx::query(
            r#"
            INSERT INTO campaign_rules (item_id, kind, value, min_quantity)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(item_id)
        .bind(kind)
        .bind(value)
        .bind(min_quantity)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(CampaignRule {
            id: result.last_insert_rowid(),
            item_id,
            kind,
            value,
            min_quantity,
        })
    }

    /// Deletes a rule.
    pub async fn delete(&self, rule_id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM campaign_rules WHERE id = ?1")
            .bind(rule_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CampaignRule", rule_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_fetch_rules() {
        let db = test_db().await;
        let item = db.items().insert("Black Tea 500g", 4500, 10).await.unwrap();

        let repo = db.campaigns();
        repo.insert(item.id, DiscountKind::Percent, 500, 1)
            .await
            .unwrap();
        repo.insert(item.id, DiscountKind::Fixed, 2000, 10)
            .await
            .unwrap();

        let rules = repo.rules_for_item(item.id).await.unwrap();
        assert_eq!(rules.len(), 2);
        // Highest threshold first
        assert_eq!(rules[0].min_quantity, 10);
        assert_eq!(rules[0].kind, DiscountKind::Fixed);
    }

    #[tokio::test]
    async fn test_insert_rejects_unknown_item() {
        let db = test_db().await;

        let err = db
            .campaigns()
            .insert(404, DiscountKind::Percent, 500, 1)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Db(DbError::ForeignKeyViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_insert_rejects_bad_values() {
        let db = test_db().await;
        let item = db.items().insert("Black Tea 500g", 4500, 10).await.unwrap();
        let repo = db.campaigns();

        // Percent above 100%
        assert!(repo
            .insert(item.id, DiscountKind::Percent, 10_001, 1)
            .await
            .is_err());
        // Zero threshold
        assert!(repo
            .insert(item.id, DiscountKind::Fixed, 100, 0)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_delete_rule() {
        let db = test_db().await;
        let item = db.items().insert("Black Tea 500g", 4500, 10).await.unwrap();
        let repo = db.campaigns();

        let rule = repo
            .insert(item.id, DiscountKind::Percent, 500, 1)
            .await
            .unwrap();

        repo.delete(rule.id).await.unwrap();
        assert!(repo.rules_for_item(item.id).await.unwrap().is_empty());
        assert!(repo.delete(rule.id).await.is_err());
    }
}

//! Budget Store (PostgreSQL)

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::domain::{Budget, BudgetLine, DimensionSnapshot, Price, UnitSize, MARKUP_MULTIPLIER};
use crate::store::{with_timeout, BudgetStore, StoreError, StoreResult};

/// (id, name, total_price)
type BudgetRow = (Uuid, String, Decimal);

/// (id, budget_id, material_name, dimension_id, dimension_metric,
///  dimension_quantity, dimension_price, quantity, price)
type LineRow = (Uuid, Uuid, String, Uuid, String, Decimal, Decimal, Decimal, Decimal);

#[derive(Debug, Clone)]
pub struct PgBudgetStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgBudgetStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Attach lines (ordered by position) to the given budget rows
    async fn hydrate(&self, rows: Vec<BudgetRow>) -> StoreResult<Vec<Budget>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|(id, _, _)| *id).collect();
        let line_rows: Vec<LineRow> = sqlx::query_as(
            r#"
            SELECT id, budget_id, material_name, dimension_id, dimension_metric,
                   dimension_quantity, dimension_price, quantity, price
            FROM budget_lines
            WHERE budget_id = ANY($1)
            ORDER BY position
            "#,
        )
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        let mut lines: HashMap<Uuid, Vec<BudgetLine>> = HashMap::new();
        for (id, budget_id, material_name, dimension_id, metric, unit, unit_price, quantity, price) in line_rows {
            lines.entry(budget_id).or_default().push(BudgetLine {
                id,
                material_name,
                dimension: DimensionSnapshot {
                    id: dimension_id,
                    metric,
                    quantity: UnitSize::new(unit)?,
                    price: Price::new(unit_price)?,
                },
                quantity,
                price: price.normalize(),
            });
        }

        Ok(rows
            .into_iter()
            .map(|(id, name, total_price)| Budget {
                id,
                name,
                lines: lines.remove(&id).unwrap_or_default(),
                total_price: total_price.normalize(),
            })
            .collect())
    }

    async fn fetch_budget(&self, id: Uuid) -> StoreResult<Option<Budget>> {
        let row: Option<BudgetRow> =
            sqlx::query_as("SELECT id, name, total_price FROM budgets WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn budget_exists(&self, id: Uuid) -> StoreResult<bool> {
        let exists = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM budgets WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

async fn insert_line<'e, E: PgExecutor<'e>>(
    executor: E,
    budget_id: Uuid,
    line: &BudgetLine,
) -> Result<u64, sqlx::Error> {
    let done = sqlx::query(
        r#"
        INSERT INTO budget_lines (
            id, budget_id, material_name, dimension_id, dimension_metric,
            dimension_quantity, dimension_price, quantity, price
        )
        SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9
        WHERE EXISTS (SELECT 1 FROM budgets WHERE id = $2)
        "#,
    )
    .bind(line.id)
    .bind(budget_id)
    .bind(&line.material_name)
    .bind(line.dimension.id)
    .bind(&line.dimension.metric)
    .bind(line.dimension.quantity.value())
    .bind(line.dimension.price.value())
    .bind(line.quantity)
    .bind(line.price)
    .execute(executor)
    .await?;

    Ok(done.rows_affected())
}

#[async_trait]
impl BudgetStore for PgBudgetStore {
    async fn list_budgets(&self) -> StoreResult<Vec<Budget>> {
        with_timeout(self.timeout, async {
            let rows: Vec<BudgetRow> =
                sqlx::query_as("SELECT id, name, total_price FROM budgets ORDER BY created_at, id")
                    .fetch_all(&self.pool)
                    .await?;
            self.hydrate(rows).await
        })
        .await
    }

    async fn list_budget_ids(&self) -> StoreResult<Vec<Uuid>> {
        with_timeout(self.timeout, async {
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM budgets ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await
                .map_err(StoreError::from)
        })
        .await
    }

    async fn get_budget(&self, id: Uuid) -> StoreResult<Option<Budget>> {
        with_timeout(self.timeout, self.fetch_budget(id)).await
    }

    async fn find_budgets_by_dimension(&self, dimension_id: Uuid) -> StoreResult<Vec<Budget>> {
        with_timeout(self.timeout, async {
            let rows: Vec<BudgetRow> = sqlx::query_as(
                r#"
                SELECT id, name, total_price
                FROM budgets
                WHERE id IN (SELECT budget_id FROM budget_lines WHERE dimension_id = $1)
                ORDER BY created_at, id
                "#,
            )
            .bind(dimension_id)
            .fetch_all(&self.pool)
            .await?;
            self.hydrate(rows).await
        })
        .await
    }

    async fn create_budget(&self, name: &str) -> StoreResult<Budget> {
        with_timeout(self.timeout, async {
            let budget = Budget::new(name);
            sqlx::query("INSERT INTO budgets (id, name, total_price) VALUES ($1, $2, $3)")
                .bind(budget.id)
                .bind(&budget.name)
                .bind(budget.total_price)
                .execute(&self.pool)
                .await?;
            Ok::<_, StoreError>(budget)
        })
        .await
    }

    async fn rename_budget(&self, id: Uuid, name: &str) -> StoreResult<Budget> {
        with_timeout(self.timeout, async {
            let rows = sqlx::query("UPDATE budgets SET name = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(name)
                .execute(&self.pool)
                .await?
                .rows_affected();

            if rows == 0 {
                return Err(StoreError::not_found("Budget", id));
            }

            self.fetch_budget(id)
                .await?
                .ok_or_else(|| StoreError::not_found("Budget", id))
        })
        .await
    }

    async fn delete_budget(&self, id: Uuid) -> StoreResult<()> {
        with_timeout(self.timeout, async {
            let rows = sqlx::query("DELETE FROM budgets WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?
                .rows_affected();

            if rows == 0 {
                return Err(StoreError::not_found("Budget", id));
            }
            Ok(())
        })
        .await
    }

    async fn append_line(&self, budget_id: Uuid, line: &BudgetLine) -> StoreResult<()> {
        with_timeout(self.timeout, async {
            if insert_line(&self.pool, budget_id, line).await? == 0 {
                return Err(StoreError::not_found("Budget", budget_id));
            }
            Ok(())
        })
        .await
    }

    async fn remove_line(&self, budget_id: Uuid, line_id: Uuid) -> StoreResult<()> {
        with_timeout(self.timeout, async {
            let rows = sqlx::query("DELETE FROM budget_lines WHERE budget_id = $1 AND id = $2")
                .bind(budget_id)
                .bind(line_id)
                .execute(&self.pool)
                .await?
                .rows_affected();

            if rows > 0 {
                return Ok(());
            }
            if !self.budget_exists(budget_id).await? {
                return Err(StoreError::not_found("Budget", budget_id));
            }
            Err(StoreError::not_found("BudgetLine", line_id))
        })
        .await
    }

    async fn remove_lines_by_dimension(&self, dimension_id: Uuid) -> StoreResult<u64> {
        with_timeout(self.timeout, async {
            sqlx::query("DELETE FROM budget_lines WHERE dimension_id = $1")
                .bind(dimension_id)
                .execute(&self.pool)
                .await
                .map(|done| done.rows_affected())
                .map_err(StoreError::from)
        })
        .await
    }

    async fn recompute_total(&self, budget_id: Uuid) -> StoreResult<Decimal> {
        with_timeout(self.timeout, async {
            let total: Option<Decimal> = sqlx::query_scalar(
                r#"
                UPDATE budgets
                SET total_price = trim_scale($2 * COALESCE(
                        (SELECT SUM(price) FROM budget_lines WHERE budget_id = $1), 0)),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING total_price
                "#,
            )
            .bind(budget_id)
            .bind(MARKUP_MULTIPLIER)
            .fetch_optional(&self.pool)
            .await?;

            // NUMERIC decoding can leave trailing zeros behind
            total
                .map(|total| total.normalize())
                .ok_or_else(|| StoreError::not_found("Budget", budget_id))
        })
        .await
    }

    async fn set_snapshot_price(&self, dimension_id: Uuid, price: Price) -> StoreResult<u64> {
        with_timeout(self.timeout, async {
            sqlx::query("UPDATE budget_lines SET dimension_price = $2 WHERE dimension_id = $1")
                .bind(dimension_id)
                .bind(price.value())
                .execute(&self.pool)
                .await
                .map(|done| done.rows_affected())
                .map_err(StoreError::from)
        })
        .await
    }

    async fn replace_lines(&self, budget_id: Uuid, lines: &[BudgetLine], total: Decimal) -> StoreResult<()> {
        with_timeout(self.timeout, async {
            let mut tx = self.pool.begin().await?;

            let rows = sqlx::query("UPDATE budgets SET total_price = $2, updated_at = NOW() WHERE id = $1")
                .bind(budget_id)
                .bind(total)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            if rows == 0 {
                return Err(StoreError::not_found("Budget", budget_id));
            }

            sqlx::query("DELETE FROM budget_lines WHERE budget_id = $1")
                .bind(budget_id)
                .execute(&mut *tx)
                .await?;

            for line in lines {
                insert_line(&mut *tx, budget_id, line).await?;
            }

            tx.commit().await?;
            Ok(())
        })
        .await
    }
}

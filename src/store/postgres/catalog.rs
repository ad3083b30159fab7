//! Dimension Catalog (PostgreSQL)

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{DimensionTemplate, UnitSize};
use crate::store::{with_timeout, DimensionCatalog, StoreError, StoreResult};

/// (id, metric, quantity)
type TemplateRow = (Uuid, String, Decimal);

fn into_template((id, metric, quantity): TemplateRow) -> StoreResult<DimensionTemplate> {
    Ok(DimensionTemplate {
        id,
        metric,
        quantity: UnitSize::new(quantity)?,
    })
}

#[derive(Debug, Clone)]
pub struct PgDimensionCatalog {
    pool: PgPool,
    timeout: Duration,
}

impl PgDimensionCatalog {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl DimensionCatalog for PgDimensionCatalog {
    async fn list_templates(&self) -> StoreResult<Vec<DimensionTemplate>> {
        with_timeout(self.timeout, async {
            let rows: Vec<TemplateRow> =
                sqlx::query_as("SELECT id, metric, quantity FROM dimensions ORDER BY created_at, id")
                    .fetch_all(&self.pool)
                    .await?;
            rows.into_iter().map(into_template).collect::<StoreResult<Vec<_>>>()
        })
        .await
    }

    async fn get_template(&self, id: Uuid) -> StoreResult<Option<DimensionTemplate>> {
        with_timeout(self.timeout, async {
            let row: Option<TemplateRow> =
                sqlx::query_as("SELECT id, metric, quantity FROM dimensions WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;
            row.map(into_template).transpose()
        })
        .await
    }

    async fn create_template(&self, metric: &str, quantity: UnitSize) -> StoreResult<DimensionTemplate> {
        with_timeout(self.timeout, async {
            let template = DimensionTemplate::new(metric, quantity);
            sqlx::query("INSERT INTO dimensions (id, metric, quantity) VALUES ($1, $2, $3)")
                .bind(template.id)
                .bind(&template.metric)
                .bind(template.quantity.value())
                .execute(&self.pool)
                .await?;
            Ok::<_, StoreError>(template)
        })
        .await
    }

    async fn update_template(&self, id: Uuid, metric: &str, quantity: UnitSize) -> StoreResult<DimensionTemplate> {
        with_timeout(self.timeout, async {
            let row: Option<TemplateRow> = sqlx::query_as(
                r#"
                UPDATE dimensions SET metric = $2, quantity = $3
                WHERE id = $1
                RETURNING id, metric, quantity
                "#,
            )
            .bind(id)
            .bind(metric)
            .bind(quantity.value())
            .fetch_optional(&self.pool)
            .await?;

            row.map(into_template)
                .transpose()?
                .ok_or_else(|| StoreError::not_found("Dimension", id))
        })
        .await
    }

    async fn delete_template(&self, id: Uuid) -> StoreResult<()> {
        with_timeout(self.timeout, async {
            let rows = sqlx::query("DELETE FROM dimensions WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?
                .rows_affected();

            if rows == 0 {
                return Err(StoreError::not_found("Dimension", id));
            }
            Ok(())
        })
        .await
    }
}

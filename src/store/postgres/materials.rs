//! Material Store (PostgreSQL)

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Dimension, Material, Price, UnitSize};
use crate::store::{with_timeout, MaterialStore, StoreError, StoreResult};

use super::conflict_on_unique;

/// (material_id, dimension_id, metric, quantity, price)
type DimensionRow = (Uuid, Uuid, String, Decimal, Decimal);

#[derive(Debug, Clone)]
pub struct PgMaterialStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgMaterialStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Load materials for `headers`, attaching their dimensions in insertion order
    async fn hydrate(&self, headers: Vec<(Uuid, String)>) -> StoreResult<Vec<Material>> {
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = headers.iter().map(|(id, _)| *id).collect();
        let rows: Vec<DimensionRow> = sqlx::query_as(
            r#"
            SELECT material_id, dimension_id, metric, quantity, price
            FROM material_dimensions
            WHERE material_id = ANY($1)
            ORDER BY seq
            "#,
        )
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        let mut dimensions: HashMap<Uuid, Vec<Dimension>> = HashMap::new();
        for (material_id, id, metric, quantity, price) in rows {
            dimensions.entry(material_id).or_default().push(Dimension {
                id,
                metric,
                quantity: UnitSize::new(quantity)?,
                price: Price::new(price)?,
            });
        }

        Ok(headers
            .into_iter()
            .map(|(id, name)| Material {
                id,
                name,
                dimensions: dimensions.remove(&id).unwrap_or_default(),
            })
            .collect())
    }

    async fn fetch_material(&self, id: Uuid) -> StoreResult<Option<Material>> {
        let header: Option<(Uuid, String)> =
            sqlx::query_as("SELECT id, name FROM materials WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match header {
            Some(header) => Ok(self.hydrate(vec![header]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn fetch_by_dimension(&self, dimension_id: Uuid) -> StoreResult<Option<Material>> {
        let header: Option<(Uuid, String)> = sqlx::query_as(
            r#"
            SELECT m.id, m.name
            FROM materials m
            JOIN material_dimensions md ON md.material_id = m.id
            WHERE md.dimension_id = $1
            ORDER BY m.created_at, m.id
            LIMIT 1
            "#,
        )
        .bind(dimension_id)
        .fetch_optional(&self.pool)
        .await?;

        match header {
            Some(header) => Ok(self.hydrate(vec![header]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn ensure_unique_name(&self, name: &str, except: Option<Uuid>) -> StoreResult<()> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM materials
                WHERE lower(name) = lower($1) AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(name)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;

        if taken {
            return Err(StoreError::Conflict(format!("material '{}' already exists", name)));
        }
        Ok(())
    }
}

#[async_trait]
impl MaterialStore for PgMaterialStore {
    async fn list_materials(&self) -> StoreResult<Vec<Material>> {
        with_timeout(self.timeout, async {
            let headers: Vec<(Uuid, String)> =
                sqlx::query_as("SELECT id, name FROM materials ORDER BY created_at, id")
                    .fetch_all(&self.pool)
                    .await?;
            self.hydrate(headers).await
        })
        .await
    }

    async fn get_material(&self, id: Uuid) -> StoreResult<Option<Material>> {
        with_timeout(self.timeout, self.fetch_material(id)).await
    }

    async fn find_material_by_dimension(&self, dimension_id: Uuid) -> StoreResult<Option<Material>> {
        with_timeout(self.timeout, self.fetch_by_dimension(dimension_id)).await
    }

    async fn create_material(&self, name: &str) -> StoreResult<Material> {
        with_timeout(self.timeout, async {
            self.ensure_unique_name(name, None).await?;

            let material = Material::new(name);
            sqlx::query("INSERT INTO materials (id, name) VALUES ($1, $2)")
                .bind(material.id)
                .bind(&material.name)
                .execute(&self.pool)
                .await
                .map_err(|e| conflict_on_unique(e, || format!("material '{}' already exists", name)))?;

            Ok::<_, StoreError>(material)
        })
        .await
    }

    async fn rename_material(&self, id: Uuid, name: &str) -> StoreResult<Material> {
        with_timeout(self.timeout, async {
            self.ensure_unique_name(name, Some(id)).await?;

            let rows = sqlx::query("UPDATE materials SET name = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(name)
                .execute(&self.pool)
                .await
                .map_err(|e| conflict_on_unique(e, || format!("material '{}' already exists", name)))?
                .rows_affected();

            if rows == 0 {
                return Err(StoreError::not_found("Material", id));
            }

            self.fetch_material(id)
                .await?
                .ok_or_else(|| StoreError::not_found("Material", id))
        })
        .await
    }

    async fn delete_material(&self, id: Uuid) -> StoreResult<()> {
        with_timeout(self.timeout, async {
            let rows = sqlx::query("DELETE FROM materials WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?
                .rows_affected();

            if rows == 0 {
                return Err(StoreError::not_found("Material", id));
            }
            Ok(())
        })
        .await
    }

    async fn add_dimension(&self, material_id: Uuid, dimension: &Dimension) -> StoreResult<Material> {
        with_timeout(self.timeout, async {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM materials WHERE id = $1)")
                .bind(material_id)
                .fetch_one(&self.pool)
                .await?;

            if !exists {
                return Err(StoreError::not_found("Material", material_id));
            }

            let rows = sqlx::query(
                r#"
                INSERT INTO material_dimensions (material_id, dimension_id, metric, quantity, price)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (material_id, dimension_id) DO NOTHING
                "#,
            )
            .bind(material_id)
            .bind(dimension.id)
            .bind(&dimension.metric)
            .bind(dimension.quantity.value())
            .bind(dimension.price.value())
            .execute(&self.pool)
            .await?
            .rows_affected();

            if rows == 0 {
                return Err(StoreError::Conflict(format!(
                    "dimension {} already attached to material {}",
                    dimension.id, material_id
                )));
            }

            self.fetch_material(material_id)
                .await?
                .ok_or_else(|| StoreError::not_found("Material", material_id))
        })
        .await
    }

    async fn set_dimension_price(&self, dimension_id: Uuid, price: Price) -> StoreResult<Material> {
        with_timeout(self.timeout, async {
            let rows = sqlx::query("UPDATE material_dimensions SET price = $2 WHERE dimension_id = $1")
                .bind(dimension_id)
                .bind(price.value())
                .execute(&self.pool)
                .await?
                .rows_affected();

            if rows == 0 {
                return Err(StoreError::not_found("Dimension", dimension_id));
            }

            self.fetch_by_dimension(dimension_id)
                .await?
                .ok_or_else(|| StoreError::not_found("Dimension", dimension_id))
        })
        .await
    }

    async fn remove_dimension(&self, dimension_id: Uuid) -> StoreResult<u64> {
        with_timeout(self.timeout, async {
            sqlx::query("DELETE FROM material_dimensions WHERE dimension_id = $1")
                .bind(dimension_id)
                .execute(&self.pool)
                .await
                .map(|done| done.rows_affected())
                .map_err(StoreError::from)
        })
        .await
    }
}

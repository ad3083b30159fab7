//! Store module
//!
//! Persistence seams for materials, budgets and the dimension catalog.
//! Each trait method is one independently committed write or one read; no
//! method spans more than one material or budget document except the bulk
//! operations keyed by dimension id.

mod error;
pub mod memory;
pub mod postgres;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Budget, BudgetLine, Dimension, DimensionTemplate, Material, Price, UnitSize};

pub use error::{StoreError, StoreResult};

/// Owns materials and their dimensions. Source of truth for unit prices.
#[async_trait]
pub trait MaterialStore: Send + Sync {
    async fn list_materials(&self) -> StoreResult<Vec<Material>>;

    async fn get_material(&self, id: Uuid) -> StoreResult<Option<Material>>;

    /// First material (creation order) owning `dimension_id`
    async fn find_material_by_dimension(&self, dimension_id: Uuid) -> StoreResult<Option<Material>>;

    /// Conflict when another material's lower-cased name equals the candidate's
    async fn create_material(&self, name: &str) -> StoreResult<Material>;

    async fn rename_material(&self, id: Uuid, name: &str) -> StoreResult<Material>;

    async fn delete_material(&self, id: Uuid) -> StoreResult<()>;

    /// Conflict when the material already has a dimension with the same id
    async fn add_dimension(&self, material_id: Uuid, dimension: &Dimension) -> StoreResult<Material>;

    /// Rewrite the price of `dimension_id` in place on every owning material.
    /// NotFound when no material owns it.
    async fn set_dimension_price(&self, dimension_id: Uuid, price: Price) -> StoreResult<Material>;

    /// Pull `dimension_id` from every material; returns how many were touched.
    async fn remove_dimension(&self, dimension_id: Uuid) -> StoreResult<u64>;
}

/// Owns budgets and their embedded lines.
#[async_trait]
pub trait BudgetStore: Send + Sync {
    async fn list_budgets(&self) -> StoreResult<Vec<Budget>>;

    async fn list_budget_ids(&self) -> StoreResult<Vec<Uuid>>;

    async fn get_budget(&self, id: Uuid) -> StoreResult<Option<Budget>>;

    /// Budgets holding at least one line whose snapshot references `dimension_id`
    async fn find_budgets_by_dimension(&self, dimension_id: Uuid) -> StoreResult<Vec<Budget>>;

    async fn create_budget(&self, name: &str) -> StoreResult<Budget>;

    async fn rename_budget(&self, id: Uuid, name: &str) -> StoreResult<Budget>;

    async fn delete_budget(&self, id: Uuid) -> StoreResult<()>;

    async fn append_line(&self, budget_id: Uuid, line: &BudgetLine) -> StoreResult<()>;

    async fn remove_line(&self, budget_id: Uuid, line_id: Uuid) -> StoreResult<()>;

    /// Pull every line, across all budgets, whose snapshot references `dimension_id`
    async fn remove_lines_by_dimension(&self, dimension_id: Uuid) -> StoreResult<u64>;

    /// Persist `3 * sum(line.price)` as the budget total and return it
    async fn recompute_total(&self, budget_id: Uuid) -> StoreResult<Decimal>;

    /// Overwrite the snapshot price on every line referencing `dimension_id`.
    /// Requested quantities and line prices are left untouched.
    async fn set_snapshot_price(&self, dimension_id: Uuid, price: Price) -> StoreResult<u64>;

    /// Replace a budget's lines and total in a single write
    async fn replace_lines(&self, budget_id: Uuid, lines: &[BudgetLine], total: Decimal) -> StoreResult<()>;
}

/// Dimension templates that can be attached to materials with a price.
#[async_trait]
pub trait DimensionCatalog: Send + Sync {
    async fn list_templates(&self) -> StoreResult<Vec<DimensionTemplate>>;

    async fn get_template(&self, id: Uuid) -> StoreResult<Option<DimensionTemplate>>;

    async fn create_template(&self, metric: &str, quantity: UnitSize) -> StoreResult<DimensionTemplate>;

    async fn update_template(&self, id: Uuid, metric: &str, quantity: UnitSize) -> StoreResult<DimensionTemplate>;

    async fn delete_template(&self, id: Uuid) -> StoreResult<()>;
}

/// Store handles built once at startup and shared by every request.
#[derive(Clone)]
pub struct Stores {
    pub materials: Arc<dyn MaterialStore>,
    pub budgets: Arc<dyn BudgetStore>,
    pub catalog: Arc<dyn DimensionCatalog>,
}

impl Stores {
    /// PostgreSQL-backed stores; every call is bounded by `timeout`
    pub fn postgres(pool: PgPool, timeout: Duration) -> Self {
        Self {
            materials: Arc::new(postgres::PgMaterialStore::new(pool.clone(), timeout)),
            budgets: Arc::new(postgres::PgBudgetStore::new(pool.clone(), timeout)),
            catalog: Arc::new(postgres::PgDimensionCatalog::new(pool, timeout)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            materials: Arc::new(memory::InMemoryMaterialStore::new()),
            budgets: Arc::new(memory::InMemoryBudgetStore::new()),
            catalog: Arc::new(memory::InMemoryDimensionCatalog::new()),
        }
    }
}

/// Run a store future under a deadline; elapsing surfaces as `StoreError::Timeout`.
pub(crate) async fn with_timeout<T, F>(timeout: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(timeout)),
    }
}

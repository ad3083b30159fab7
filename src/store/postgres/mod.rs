//! PostgreSQL stores
//!
//! Materials, budgets and the catalog each live in their own tables; embedded
//! dimensions and lines are child rows ordered by insertion sequence.
//! Lookups by dimension id are served by `*_dimension_idx` indexes.

mod budgets;
mod catalog;
mod materials;

pub use budgets::PgBudgetStore;
pub use catalog::PgDimensionCatalog;
pub use materials::PgMaterialStore;

use super::StoreError;

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Map a unique violation to `StoreError::Conflict`, anything else to `Database`
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: impl FnOnce() -> String) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Conflict(message())
        }
        _ => StoreError::Database(e),
    }
}

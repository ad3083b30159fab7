//! Database module
//!
//! Database connection and schema utilities.

use sqlx::{Executor, PgPool};

/// Schema applied by `apply_schema` (same file the migrations directory ships)
pub const SCHEMA_SQL: &str = include_str!("../migrations/0001_initial_schema.sql");

/// Tables the stores read and write
const REQUIRED_TABLES: [&str; 5] = [
    "materials",
    "material_dimensions",
    "budgets",
    "budget_lines",
    "dimensions",
];

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Create any missing tables and indexes. Statements are idempotent.
pub async fn apply_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    pool.execute(SCHEMA_SQL).await?;
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    Ok(true)
}

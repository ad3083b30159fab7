//! Price Change Handler
//!
//! Rewrites a dimension's price on the material side and propagates it into
//! every budget line snapshot that references the dimension.
//!
//! Steps commit independently. The material write and the bulk snapshot
//! overwrite are fatal when they fail; each per-budget rewrite is not, and a
//! failed budget stays stale until the same command is applied again.

use crate::domain::OperationContext;
use crate::error::AppError;
use crate::store::{StoreError, Stores};

use super::{CascadeReport, ChangeDimensionPriceCommand, PriceChangeResult};

pub struct ChangeDimensionPriceHandler {
    stores: Stores,
}

impl ChangeDimensionPriceHandler {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn execute(
        &self,
        command: ChangeDimensionPriceCommand,
        context: &OperationContext,
    ) -> Result<PriceChangeResult, AppError> {
        let dimension_id = command.dimension_id;

        let material = self
            .stores
            .materials
            .set_dimension_price(dimension_id, command.price)
            .await
            .map_err(|e| {
                tracing::error!(
                    dimension_id = %dimension_id,
                    correlation_id = ?context.correlation_id,
                    error = %e,
                    "Dimension price update failed"
                );
                e
            })?;

        tracing::info!(
            dimension_id = %dimension_id,
            material_id = %material.id,
            price = %command.price,
            correlation_id = ?context.correlation_id,
            "Dimension price updated"
        );

        let affected = self.stores.budgets.find_budgets_by_dimension(dimension_id).await?;
        if affected.is_empty() {
            return Ok(PriceChangeResult {
                material,
                cascade: CascadeReport::default(),
            });
        }

        let snapshots = self
            .stores
            .budgets
            .set_snapshot_price(dimension_id, command.price)
            .await?;

        tracing::debug!(
            dimension_id = %dimension_id,
            snapshots,
            budgets = affected.len(),
            "Snapshot prices overwritten"
        );

        let mut cascade = CascadeReport::default();
        for budget_id in affected.into_iter().map(|b| b.id) {
            match self.reprice_budget(budget_id).await {
                Ok(()) => cascade.affected.push(budget_id),
                Err(e) => {
                    tracing::error!(
                        dimension_id = %dimension_id,
                        budget_id = %budget_id,
                        correlation_id = ?context.correlation_id,
                        error = %e,
                        "Budget reprice failed, continuing cascade"
                    );
                    cascade.failed.push(budget_id);
                }
            }
        }

        if !cascade.is_complete() {
            tracing::warn!(
                dimension_id = %dimension_id,
                failed = cascade.failed.len(),
                "Price cascade finished with stale budgets"
            );
        }

        Ok(PriceChangeResult { material, cascade })
    }

    /// Re-read one budget, recompute every line from its snapshot and persist
    /// the lines with the new total in a single write.
    async fn reprice_budget(&self, budget_id: uuid::Uuid) -> Result<(), AppError> {
        let mut budget = self
            .stores
            .budgets
            .get_budget(budget_id)
            .await?
            .ok_or(StoreError::not_found("Budget", budget_id))?;

        budget.reprice()?;

        self.stores
            .budgets
            .replace_lines(budget.id, &budget.lines, budget.total_price)
            .await?;

        Ok(())
    }
}

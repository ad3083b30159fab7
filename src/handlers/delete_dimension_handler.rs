//! Delete Dimension Handler
//!
//! Pulls a dimension out of every material, removes every budget line built
//! from it and recomputes budget totals. Lines must be gone before totals are
//! recomputed, otherwise a stored total would still include them.

use crate::domain::OperationContext;
use crate::error::AppError;
use crate::store::{StoreError, Stores};

use super::{CascadeReport, DeleteDimensionCommand, DeleteDimensionResult};

pub struct DeleteDimensionHandler {
    stores: Stores,
}

impl DeleteDimensionHandler {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn execute(
        &self,
        command: DeleteDimensionCommand,
        context: &OperationContext,
    ) -> Result<DeleteDimensionResult, AppError> {
        let dimension_id = command.dimension_id;

        if command.remove_catalog_entry {
            match self.stores.catalog.delete_template(dimension_id).await {
                Ok(()) => {}
                // Not every dimension comes from the catalog; a retry also lands here.
                Err(StoreError::NotFound { .. }) => {
                    tracing::debug!(dimension_id = %dimension_id, "No catalog entry to remove");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let materials_updated = self.stores.materials.remove_dimension(dimension_id).await?;
        let lines_removed = self
            .stores
            .budgets
            .remove_lines_by_dimension(dimension_id)
            .await?;

        tracing::info!(
            dimension_id = %dimension_id,
            materials_updated,
            lines_removed,
            correlation_id = ?context.correlation_id,
            "Dimension removed from materials and budgets"
        );

        let mut cascade = CascadeReport::default();
        for budget_id in self.stores.budgets.list_budget_ids().await? {
            match self.stores.budgets.recompute_total(budget_id).await {
                Ok(_) => cascade.affected.push(budget_id),
                Err(e) => {
                    tracing::error!(
                        dimension_id = %dimension_id,
                        budget_id = %budget_id,
                        correlation_id = ?context.correlation_id,
                        error = %e,
                        "Budget total recompute failed, continuing cascade"
                    );
                    cascade.failed.push(budget_id);
                }
            }
        }

        Ok(DeleteDimensionResult {
            dimension_id,
            materials_updated,
            lines_removed,
            cascade,
        })
    }
}

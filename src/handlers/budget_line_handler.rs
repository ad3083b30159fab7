//! Budget Line Handlers
//!
//! Adding a material to a budget and removing a single line. Both finish by
//! recomputing the stored budget total.

use crate::domain::{BudgetLine, DomainError, OperationContext};
use crate::error::AppError;
use crate::store::Stores;

use super::{AddMaterialToBudgetCommand, BudgetResult, RemoveBudgetLineCommand};

// =========================================================================
// AddMaterialToBudgetHandler
// =========================================================================

pub struct AddMaterialToBudgetHandler {
    stores: Stores,
}

impl AddMaterialToBudgetHandler {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn execute(
        &self,
        command: AddMaterialToBudgetCommand,
        context: &OperationContext,
    ) -> Result<BudgetResult, AppError> {
        let budget_id = command.budget_id;

        self.stores
            .budgets
            .get_budget(budget_id)
            .await?
            .ok_or_else(|| AppError::not_found("Budget", budget_id))?;

        let material = self
            .stores
            .materials
            .get_material(command.material_id)
            .await?
            .ok_or_else(|| AppError::not_found("Material", command.material_id))?;

        let dimension = material
            .dimension_by_label(&command.metric)
            .ok_or_else(|| DomainError::metric_mismatch(&material.name, &command.metric))?;

        let line = BudgetLine::new(&material, dimension, command.quantity)?;

        self.stores.budgets.append_line(budget_id, &line).await?;
        let total = self.stores.budgets.recompute_total(budget_id).await?;

        tracing::info!(
            budget_id = %budget_id,
            material_id = %material.id,
            dimension_id = %dimension.id,
            line_id = %line.id,
            line_price = %line.price,
            total_price = %total,
            correlation_id = ?context.correlation_id,
            "Material added to budget"
        );

        let budget = self
            .stores
            .budgets
            .get_budget(budget_id)
            .await?
            .ok_or_else(|| AppError::not_found("Budget", budget_id))?;

        Ok(BudgetResult { budget })
    }
}

// =========================================================================
// RemoveBudgetLineHandler
// =========================================================================

pub struct RemoveBudgetLineHandler {
    stores: Stores,
}

impl RemoveBudgetLineHandler {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn execute(
        &self,
        command: RemoveBudgetLineCommand,
        context: &OperationContext,
    ) -> Result<BudgetResult, AppError> {
        let budget_id = command.budget_id;

        self.stores.budgets.remove_line(budget_id, command.line_id).await?;
        let total = self.stores.budgets.recompute_total(budget_id).await?;

        tracing::info!(
            budget_id = %budget_id,
            line_id = %command.line_id,
            total_price = %total,
            correlation_id = ?context.correlation_id,
            "Budget line removed"
        );

        let budget = self
            .stores
            .budgets
            .get_budget(budget_id)
            .await?
            .ok_or_else(|| AppError::not_found("Budget", budget_id))?;

        Ok(BudgetResult { budget })
    }
}

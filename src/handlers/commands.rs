//! Command definitions
//!
//! Commands represent intentions to change the system state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Budget, Material, Price, UnitSize};

// =========================================================================
// AddMaterialToBudgetCommand
// =========================================================================

/// Command to add a material to a budget at one of its rendered dimension labels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMaterialToBudgetCommand {
    pub budget_id: Uuid,
    pub material_id: Uuid,
    /// Rendered dimension label, e.g. "25 kg"
    pub metric: String,
    /// Requested quantity for this budget
    pub quantity: Decimal,
}

impl AddMaterialToBudgetCommand {
    pub fn new(budget_id: Uuid, material_id: Uuid, metric: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            budget_id,
            material_id,
            metric: metric.into(),
            quantity,
        }
    }
}

// =========================================================================
// RemoveBudgetLineCommand
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveBudgetLineCommand {
    pub budget_id: Uuid,
    pub line_id: Uuid,
}

impl RemoveBudgetLineCommand {
    pub fn new(budget_id: Uuid, line_id: Uuid) -> Self {
        Self { budget_id, line_id }
    }
}

// =========================================================================
// AddDimensionCommand
// =========================================================================

/// Where a new material dimension comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DimensionSource {
    /// Brand-new dimension with a fresh identifier
    New { metric: String, quantity: UnitSize },
    /// Catalog template; the dimension keeps the template's identifier
    Template(Uuid),
}

/// Command to add a priced dimension to a material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDimensionCommand {
    pub material_id: Uuid,
    pub source: DimensionSource,
    pub price: Price,
}

impl AddDimensionCommand {
    pub fn new_dimension(material_id: Uuid, metric: impl Into<String>, quantity: UnitSize, price: Price) -> Self {
        Self {
            material_id,
            source: DimensionSource::New {
                metric: metric.into(),
                quantity,
            },
            price,
        }
    }

    pub fn from_template(material_id: Uuid, template_id: Uuid, price: Price) -> Self {
        Self {
            material_id,
            source: DimensionSource::Template(template_id),
            price,
        }
    }
}

// =========================================================================
// ChangeDimensionPriceCommand
// =========================================================================

/// Command to reprice a dimension and propagate it into every budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeDimensionPriceCommand {
    pub dimension_id: Uuid,
    pub price: Price,
}

impl ChangeDimensionPriceCommand {
    pub fn new(dimension_id: Uuid, price: Price) -> Self {
        Self { dimension_id, price }
    }
}

// =========================================================================
// DeleteDimensionCommand
// =========================================================================

/// Command to delete a dimension and clean it out of every budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDimensionCommand {
    pub dimension_id: Uuid,
    /// Also remove the catalog template with the same identifier
    pub remove_catalog_entry: bool,
}

impl DeleteDimensionCommand {
    /// Full delete: catalog entry, material dimensions and budget lines
    pub fn new(dimension_id: Uuid) -> Self {
        Self {
            dimension_id,
            remove_catalog_entry: true,
        }
    }

    /// Detach from materials and budgets but keep the catalog template
    pub fn detach_only(mut self) -> Self {
        self.remove_catalog_entry = false;
        self
    }
}

// =========================================================================
// Results
// =========================================================================

/// Outcome of a best-effort budget cascade
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CascadeReport {
    /// Budgets rewritten successfully
    pub affected: Vec<Uuid>,
    /// Budgets whose individual write failed; retrying the same call repairs them
    pub failed: Vec<Uuid>,
}

impl CascadeReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceChangeResult {
    pub material: Material,
    pub cascade: CascadeReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDimensionResult {
    pub dimension_id: Uuid,
    /// Materials the dimension was pulled from
    pub materials_updated: u64,
    /// Budget lines removed across all budgets
    pub lines_removed: u64,
    pub cascade: CascadeReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetResult {
    pub budget: Budget,
}

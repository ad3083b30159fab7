//! Budget entities and pricing rules
//!
//! A budget line holds a denormalized snapshot of the dimension it was built
//! from. The snapshot's metric, quantity and price are a cache: they go stale
//! when the source dimension changes and stay stale until the propagation
//! cascade rewrites them. Only the snapshot identifier links back to the
//! material side.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Dimension, DomainError, Material, Price, UnitSize};

/// Fixed multiplier applied to the sum of line prices
pub const MARKUP_MULTIPLIER: Decimal = Decimal::from_parts(3, 0, 0, false, 0);

/// Copy of a dimension taken when a material is added to a budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionSnapshot {
    /// Identifier of the originating dimension
    pub id: Uuid,
    pub metric: String,
    pub quantity: UnitSize,
    pub price: Price,
}

impl From<&Dimension> for DimensionSnapshot {
    fn from(dimension: &Dimension) -> Self {
        Self {
            id: dimension.id,
            metric: dimension.metric.clone(),
            quantity: dimension.quantity,
            price: dimension.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLine {
    pub id: Uuid,
    pub material_name: String,
    pub dimension: DimensionSnapshot,
    /// Amount chosen for this budget, independent of the dimension's unit size
    pub quantity: Decimal,
    pub price: Decimal,
}

impl BudgetLine {
    /// Build a new line for `material` using `dimension`, pricing it immediately.
    pub fn new(
        material: &Material,
        dimension: &Dimension,
        quantity: Decimal,
    ) -> Result<Self, DomainError> {
        if quantity.is_zero() {
            return Err(DomainError::ZeroQuantity);
        }

        let snapshot = DimensionSnapshot::from(dimension);
        let price = line_price(quantity, &snapshot)?;

        Ok(Self {
            id: Uuid::new_v4(),
            material_name: material.name.clone(),
            dimension: snapshot,
            quantity,
            price,
        })
    }

    /// Recompute `price` from the current snapshot.
    pub fn reprice(&mut self) -> Result<(), DomainError> {
        self.price = line_price(self.quantity, &self.dimension)?;
        Ok(())
    }
}

/// `requested / snapshot.quantity * snapshot.price`, evaluated in that order.
/// The result is normalized so equal prices render identically.
pub fn line_price(requested: Decimal, snapshot: &DimensionSnapshot) -> Result<Decimal, DomainError> {
    let unit = snapshot.quantity.value();
    let price = snapshot.price.value();

    requested
        .checked_div(unit)
        .and_then(|units| units.checked_mul(price))
        .map(|p| p.normalize())
        .ok_or_else(|| DomainError::price_overflow(requested, unit, price))
}

/// `MARKUP_MULTIPLIER * sum(line.price)`
pub fn total_price(lines: &[BudgetLine]) -> Result<Decimal, DomainError> {
    let sum = lines
        .iter()
        .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.price))
        .ok_or_else(|| DomainError::PriceOverflow("sum of line prices".to_string()))?;

    sum.checked_mul(MARKUP_MULTIPLIER)
        .map(|t| t.normalize())
        .ok_or_else(|| DomainError::PriceOverflow("budget total".to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub name: String,
    pub lines: Vec<BudgetLine>,
    pub total_price: Decimal,
}

impl Budget {
    /// Create a budget with no lines
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            lines: Vec::new(),
            total_price: Decimal::ZERO,
        }
    }

    pub fn references_dimension(&self, dimension_id: Uuid) -> bool {
        self.lines.iter().any(|l| l.dimension.id == dimension_id)
    }

    /// Reprice every line from its snapshot and recompute the total.
    pub fn reprice(&mut self) -> Result<(), DomainError> {
        for line in &mut self.lines {
            line.reprice()?;
        }
        self.total_price = total_price(&self.lines)?;
        Ok(())
    }
}

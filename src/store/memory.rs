//! In-memory stores
//!
//! Process-local implementations of the store traits, used by the test suite
//! and by `STORE_BACKEND=memory`. Each method takes the lock once, so a single
//! call behaves like one atomic document write, and nothing spans calls.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{total_price, Budget, BudgetLine, Dimension, DimensionTemplate, Material, Price, UnitSize};

use super::{BudgetStore, DimensionCatalog, MaterialStore, StoreError, StoreResult};

// =========================================================================
// Materials
// =========================================================================

#[derive(Debug, Default)]
pub struct InMemoryMaterialStore {
    materials: RwLock<Vec<Material>>,
}

impl InMemoryMaterialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn ensure_unique_name(materials: &[Material], name: &str, except: Option<Uuid>) -> StoreResult<()> {
    let taken = materials
        .iter()
        .any(|m| Some(m.id) != except && m.name_matches(name));

    if taken {
        return Err(StoreError::Conflict(format!("material '{}' already exists", name)));
    }
    Ok(())
}

#[async_trait]
impl MaterialStore for InMemoryMaterialStore {
    async fn list_materials(&self) -> StoreResult<Vec<Material>> {
        Ok(self.materials.read().await.clone())
    }

    async fn get_material(&self, id: Uuid) -> StoreResult<Option<Material>> {
        Ok(self.materials.read().await.iter().find(|m| m.id == id).cloned())
    }

    async fn find_material_by_dimension(&self, dimension_id: Uuid) -> StoreResult<Option<Material>> {
        let materials = self.materials.read().await;
        Ok(materials.iter().find(|m| m.has_dimension(dimension_id)).cloned())
    }

    async fn create_material(&self, name: &str) -> StoreResult<Material> {
        let mut materials = self.materials.write().await;
        ensure_unique_name(&materials, name, None)?;

        let material = Material::new(name);
        materials.push(material.clone());
        Ok(material)
    }

    async fn rename_material(&self, id: Uuid, name: &str) -> StoreResult<Material> {
        let mut materials = self.materials.write().await;
        ensure_unique_name(&materials, name, Some(id))?;

        let material = materials
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| StoreError::not_found("Material", id))?;
        material.name = name.to_string();
        Ok(material.clone())
    }

    async fn delete_material(&self, id: Uuid) -> StoreResult<()> {
        let mut materials = self.materials.write().await;
        let before = materials.len();
        materials.retain(|m| m.id != id);

        if materials.len() == before {
            return Err(StoreError::not_found("Material", id));
        }
        Ok(())
    }

    async fn add_dimension(&self, material_id: Uuid, dimension: &Dimension) -> StoreResult<Material> {
        let mut materials = self.materials.write().await;
        let material = materials
            .iter_mut()
            .find(|m| m.id == material_id)
            .ok_or_else(|| StoreError::not_found("Material", material_id))?;

        if material.has_dimension(dimension.id) {
            return Err(StoreError::Conflict(format!(
                "dimension {} already attached to material {}",
                dimension.id, material_id
            )));
        }

        material.dimensions.push(dimension.clone());
        Ok(material.clone())
    }

    async fn set_dimension_price(&self, dimension_id: Uuid, price: Price) -> StoreResult<Material> {
        let mut materials = self.materials.write().await;
        let mut first_owner = None;

        for material in materials.iter_mut() {
            let mut owns = false;
            for dimension in material.dimensions.iter_mut().filter(|d| d.id == dimension_id) {
                dimension.price = price;
                owns = true;
            }
            if owns && first_owner.is_none() {
                first_owner = Some(material.clone());
            }
        }

        first_owner.ok_or_else(|| StoreError::not_found("Dimension", dimension_id))
    }

    async fn remove_dimension(&self, dimension_id: Uuid) -> StoreResult<u64> {
        let mut materials = self.materials.write().await;
        let mut touched = 0;

        for material in materials.iter_mut() {
            let before = material.dimensions.len();
            material.dimensions.retain(|d| d.id != dimension_id);
            if material.dimensions.len() != before {
                touched += 1;
            }
        }

        Ok(touched)
    }
}

// =========================================================================
// Budgets
// =========================================================================

#[derive(Debug, Default)]
pub struct InMemoryBudgetStore {
    budgets: RwLock<Vec<Budget>>,
}

impl InMemoryBudgetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn budget_mut(budgets: &mut [Budget], id: Uuid) -> StoreResult<&mut Budget> {
    budgets
        .iter_mut()
        .find(|b| b.id == id)
        .ok_or_else(|| StoreError::not_found("Budget", id))
}

#[async_trait]
impl BudgetStore for InMemoryBudgetStore {
    async fn list_budgets(&self) -> StoreResult<Vec<Budget>> {
        Ok(self.budgets.read().await.clone())
    }

    async fn list_budget_ids(&self) -> StoreResult<Vec<Uuid>> {
        Ok(self.budgets.read().await.iter().map(|b| b.id).collect())
    }

    async fn get_budget(&self, id: Uuid) -> StoreResult<Option<Budget>> {
        Ok(self.budgets.read().await.iter().find(|b| b.id == id).cloned())
    }

    async fn find_budgets_by_dimension(&self, dimension_id: Uuid) -> StoreResult<Vec<Budget>> {
        let budgets = self.budgets.read().await;
        Ok(budgets
            .iter()
            .filter(|b| b.references_dimension(dimension_id))
            .cloned()
            .collect())
    }

    async fn create_budget(&self, name: &str) -> StoreResult<Budget> {
        let budget = Budget::new(name);
        self.budgets.write().await.push(budget.clone());
        Ok(budget)
    }

    async fn rename_budget(&self, id: Uuid, name: &str) -> StoreResult<Budget> {
        let mut budgets = self.budgets.write().await;
        let budget = budget_mut(&mut budgets, id)?;
        budget.name = name.to_string();
        Ok(budget.clone())
    }

    async fn delete_budget(&self, id: Uuid) -> StoreResult<()> {
        let mut budgets = self.budgets.write().await;
        let before = budgets.len();
        budgets.retain(|b| b.id != id);

        if budgets.len() == before {
            return Err(StoreError::not_found("Budget", id));
        }
        Ok(())
    }

    async fn append_line(&self, budget_id: Uuid, line: &BudgetLine) -> StoreResult<()> {
        let mut budgets = self.budgets.write().await;
        budget_mut(&mut budgets, budget_id)?.lines.push(line.clone());
        Ok(())
    }

    async fn remove_line(&self, budget_id: Uuid, line_id: Uuid) -> StoreResult<()> {
        let mut budgets = self.budgets.write().await;
        let budget = budget_mut(&mut budgets, budget_id)?;
        let before = budget.lines.len();
        budget.lines.retain(|l| l.id != line_id);

        if budget.lines.len() == before {
            return Err(StoreError::not_found("BudgetLine", line_id));
        }
        Ok(())
    }

    async fn remove_lines_by_dimension(&self, dimension_id: Uuid) -> StoreResult<u64> {
        let mut budgets = self.budgets.write().await;
        let mut removed = 0;

        for budget in budgets.iter_mut() {
            let before = budget.lines.len();
            budget.lines.retain(|l| l.dimension.id != dimension_id);
            removed += (before - budget.lines.len()) as u64;
        }

        Ok(removed)
    }

    async fn recompute_total(&self, budget_id: Uuid) -> StoreResult<Decimal> {
        let mut budgets = self.budgets.write().await;
        let budget = budget_mut(&mut budgets, budget_id)?;
        budget.total_price =
            total_price(&budget.lines).map_err(|e| StoreError::InvalidData(e.to_string()))?;
        Ok(budget.total_price)
    }

    async fn set_snapshot_price(&self, dimension_id: Uuid, price: Price) -> StoreResult<u64> {
        let mut budgets = self.budgets.write().await;
        let mut updated = 0;

        for line in budgets
            .iter_mut()
            .flat_map(|b| b.lines.iter_mut())
            .filter(|l| l.dimension.id == dimension_id)
        {
            line.dimension.price = price;
            updated += 1;
        }

        Ok(updated)
    }

    async fn replace_lines(&self, budget_id: Uuid, lines: &[BudgetLine], total: Decimal) -> StoreResult<()> {
        let mut budgets = self.budgets.write().await;
        let budget = budget_mut(&mut budgets, budget_id)?;
        budget.lines = lines.to_vec();
        budget.total_price = total;
        Ok(())
    }
}

// =========================================================================
// Dimension catalog
// =========================================================================

#[derive(Debug, Default)]
pub struct InMemoryDimensionCatalog {
    templates: RwLock<Vec<DimensionTemplate>>,
}

impl InMemoryDimensionCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DimensionCatalog for InMemoryDimensionCatalog {
    async fn list_templates(&self) -> StoreResult<Vec<DimensionTemplate>> {
        Ok(self.templates.read().await.clone())
    }

    async fn get_template(&self, id: Uuid) -> StoreResult<Option<DimensionTemplate>> {
        Ok(self.templates.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn create_template(&self, metric: &str, quantity: UnitSize) -> StoreResult<DimensionTemplate> {
        let template = DimensionTemplate::new(metric, quantity);
        self.templates.write().await.push(template.clone());
        Ok(template)
    }

    async fn update_template(&self, id: Uuid, metric: &str, quantity: UnitSize) -> StoreResult<DimensionTemplate> {
        let mut templates = self.templates.write().await;
        let template = templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::not_found("Dimension", id))?;
        template.metric = metric.to_string();
        template.quantity = quantity;
        Ok(template.clone())
    }

    async fn delete_template(&self, id: Uuid) -> StoreResult<()> {
        let mut templates = self.templates.write().await;
        let before = templates.len();
        templates.retain(|t| t.id != id);

        if templates.len() == before {
            return Err(StoreError::not_found("Dimension", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn dimension(quantity: Decimal, price: Decimal) -> Dimension {
        Dimension::new("kg", UnitSize::new(quantity).unwrap(), Price::new(price).unwrap())
    }

    #[tokio::test]
    async fn test_create_material_rejects_case_insensitive_duplicate() {
        let store = InMemoryMaterialStore::new();
        store.create_material("Flour").await.unwrap();

        let result = store.create_material("fLoUr").await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(store.list_materials().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rename_to_own_name_is_allowed() {
        let store = InMemoryMaterialStore::new();
        let flour = store.create_material("Flour").await.unwrap();
        store.create_material("Sugar").await.unwrap();

        let renamed = store.rename_material(flour.id, "FLOUR").await.unwrap();
        assert_eq!(renamed.name, "FLOUR");

        let result = store.rename_material(flour.id, "sugar").await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_add_dimension_twice_conflicts() {
        let store = InMemoryMaterialStore::new();
        let flour = store.create_material("Flour").await.unwrap();
        let dim = dimension(dec!(25), dec!(50));

        store.add_dimension(flour.id, &dim).await.unwrap();
        let result = store.add_dimension(flour.id, &dim).await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_set_dimension_price_unknown_dimension() {
        let store = InMemoryMaterialStore::new();
        let result = store.set_dimension_price(Uuid::new_v4(), Price::zero()).await;
        assert!(matches!(result, Err(StoreError::NotFound { entity: "Dimension", .. })));
    }

    #[tokio::test]
    async fn test_remove_dimension_is_idempotent() {
        let store = InMemoryMaterialStore::new();
        let flour = store.create_material("Flour").await.unwrap();
        let dim = dimension(dec!(25), dec!(50));
        store.add_dimension(flour.id, &dim).await.unwrap();

        assert_eq!(store.remove_dimension(dim.id).await.unwrap(), 1);
        assert_eq!(store.remove_dimension(dim.id).await.unwrap(), 0);
        assert!(store.find_material_by_dimension(dim.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_snapshot_price_leaves_line_price_alone() {
        let materials = InMemoryMaterialStore::new();
        let budgets = InMemoryBudgetStore::new();
        let flour = materials.create_material("Flour").await.unwrap();
        let dim = dimension(dec!(25), dec!(50));
        let flour = materials.add_dimension(flour.id, &dim).await.unwrap();

        let cake = budgets.create_budget("Cake").await.unwrap();
        let line = BudgetLine::new(&flour, &dim, dec!(5)).unwrap();
        budgets.append_line(cake.id, &line).await.unwrap();

        let updated = budgets
            .set_snapshot_price(dim.id, Price::new(dec!(100)).unwrap())
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let cake = budgets.get_budget(cake.id).await.unwrap().unwrap();
        assert_eq!(cake.lines[0].dimension.price.value(), dec!(100));
        assert_eq!(cake.lines[0].price, dec!(10));
        assert_eq!(cake.lines[0].quantity, dec!(5));
    }

    #[tokio::test]
    async fn test_delete_material_keeps_budget_lines() {
        let materials = InMemoryMaterialStore::new();
        let budgets = InMemoryBudgetStore::new();
        let flour = materials.create_material("Flour").await.unwrap();
        let dim = dimension(dec!(25), dec!(50));
        let flour = materials.add_dimension(flour.id, &dim).await.unwrap();

        let cake = budgets.create_budget("Cake").await.unwrap();
        let line = BudgetLine::new(&flour, &dim, dec!(5)).unwrap();
        budgets.append_line(cake.id, &line).await.unwrap();

        materials.delete_material(flour.id).await.unwrap();
        assert!(materials.get_material(flour.id).await.unwrap().is_none());
        assert!(matches!(
            materials.delete_material(flour.id).await,
            Err(StoreError::NotFound { entity: "Material", .. })
        ));

        let cake = budgets.get_budget(cake.id).await.unwrap().unwrap();
        assert_eq!(cake.lines, vec![line]);
        assert_eq!(cake.lines[0].material_name, "Flour");
    }

    #[tokio::test]
    async fn test_rename_budget_preserves_lines_and_total() {
        let materials = InMemoryMaterialStore::new();
        let budgets = InMemoryBudgetStore::new();
        let flour = materials.create_material("Flour").await.unwrap();
        let dim = dimension(dec!(25), dec!(50));
        let flour = materials.add_dimension(flour.id, &dim).await.unwrap();

        let cake = budgets.create_budget("Cake").await.unwrap();
        let line = BudgetLine::new(&flour, &dim, dec!(5)).unwrap();
        budgets.append_line(cake.id, &line).await.unwrap();
        assert_eq!(budgets.recompute_total(cake.id).await.unwrap(), dec!(30));

        let renamed = budgets.rename_budget(cake.id, "Birthday cake").await.unwrap();
        assert_eq!(renamed.name, "Birthday cake");
        assert_eq!(renamed.lines, vec![line]);
        assert_eq!(renamed.total_price, dec!(30));
        assert_eq!(budgets.get_budget(cake.id).await.unwrap().unwrap(), renamed);
    }

    #[tokio::test]
    async fn test_delete_budget_twice() {
        let budgets = InMemoryBudgetStore::new();
        let cake = budgets.create_budget("Cake").await.unwrap();
        let other = budgets.create_budget("Bread").await.unwrap();

        budgets.delete_budget(cake.id).await.unwrap();
        assert!(budgets.get_budget(cake.id).await.unwrap().is_none());
        assert!(matches!(
            budgets.delete_budget(cake.id).await,
            Err(StoreError::NotFound { entity: "Budget", .. })
        ));
        assert_eq!(budgets.list_budgets().await.unwrap(), vec![other]);
    }

    #[tokio::test]
    async fn test_recompute_total_on_missing_budget() {
        let budgets = InMemoryBudgetStore::new();
        let result = budgets.recompute_total(Uuid::new_v4()).await;
        assert!(matches!(result, Err(StoreError::NotFound { entity: "Budget", .. })));
    }

    #[tokio::test]
    async fn test_catalog_update_and_delete() {
        let catalog = InMemoryDimensionCatalog::new();
        let template = catalog
            .create_template("kg", UnitSize::new(dec!(25)).unwrap())
            .await
            .unwrap();

        let updated = catalog
            .update_template(template.id, "g", UnitSize::new(dec!(500)).unwrap())
            .await
            .unwrap();
        assert_eq!(updated.metric, "g");

        catalog.delete_template(template.id).await.unwrap();
        assert!(catalog.get_template(template.id).await.unwrap().is_none());
        assert!(catalog.delete_template(template.id).await.is_err());
    }
}

//! Material and Dimension entities
//!
//! A material is offered in one or more purchasable dimensions. The
//! dimension's price is the source of truth that budget lines copy.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Price, UnitSize};

/// A purchasable unit of a material (e.g. "25 kg" for 50).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub id: Uuid,
    pub metric: String,
    pub quantity: UnitSize,
    pub price: Price,
}

impl Dimension {
    /// Create a dimension with a freshly generated identifier
    pub fn new(metric: impl Into<String>, quantity: UnitSize, price: Price) -> Self {
        Self {
            id: Uuid::new_v4(),
            metric: metric.into(),
            quantity,
            price,
        }
    }

    /// Create a dimension from a catalog template, keeping the template's identifier
    pub fn from_template(template: &DimensionTemplate, price: Price) -> Self {
        Self {
            id: template.id,
            metric: template.metric.clone(),
            quantity: template.quantity,
            price,
        }
    }

    /// Label a caller uses to pick this dimension, e.g. "25 kg"
    pub fn label(&self) -> String {
        render_label(self.quantity, &self.metric)
    }
}

/// Render "<quantity> <metric>" with the quantity normalized.
pub fn render_label(quantity: UnitSize, metric: &str) -> String {
    format!("{} {}", quantity, metric)
}

/// Material with its dimensions, in the order they were added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    pub name: String,
    pub dimensions: Vec<Dimension>,
}

impl Material {
    /// Create a material with no dimensions
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            dimensions: Vec::new(),
        }
    }

    /// First dimension, in enumeration order, whose label equals `label`.
    pub fn dimension_by_label(&self, label: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.label() == label)
    }

    pub fn dimension(&self, dimension_id: Uuid) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.id == dimension_id)
    }

    pub fn has_dimension(&self, dimension_id: Uuid) -> bool {
        self.dimension(dimension_id).is_some()
    }

    /// Case-insensitive name comparison used for duplicate detection
    pub fn name_matches(&self, candidate: &str) -> bool {
        self.name.to_lowercase() == candidate.to_lowercase()
    }
}

/// Catalog entry describing a dimension shape without a price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionTemplate {
    pub id: Uuid,
    pub metric: String,
    pub quantity: UnitSize,
}

impl DimensionTemplate {
    pub fn new(metric: impl Into<String>, quantity: UnitSize) -> Self {
        Self {
            id: Uuid::new_v4(),
            metric: metric.into(),
            quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn dimension(quantity: &str, metric: &str, price: &str) -> Dimension {
        Dimension::new(metric, quantity.parse().unwrap(), price.parse().unwrap())
    }

    #[test]
    fn test_label_rendering() {
        assert_eq!(dimension("25", "kg", "50").label(), "25 kg");
        assert_eq!(dimension("0.50", "l", "3").label(), "0.5 l");
    }

    #[test]
    fn test_dimension_by_label_first_match_wins() {
        let mut material = Material::new("Flour");
        let first = dimension("1", "kg", "10");
        let second = dimension("1.0", "kg", "12");
        material.dimensions.push(first.clone());
        material.dimensions.push(second);

        let found = material.dimension_by_label("1 kg").unwrap();
        assert_eq!(found.id, first.id);
        assert_eq!(found.price.value(), dec!(10));
    }

    #[test]
    fn test_dimension_by_label_no_match() {
        let mut material = Material::new("Flour");
        material.dimensions.push(dimension("25", "kg", "50"));

        assert!(material.dimension_by_label("10 kg").is_none());
        assert!(material.dimension_by_label("25kg").is_none());
    }

    #[test]
    fn test_name_matches_is_case_insensitive() {
        let material = Material::new("Flour");
        assert!(material.name_matches("FLOUR"));
        assert!(!material.name_matches("Sugar"));
    }

    #[test]
    fn test_from_template_keeps_identifier() {
        let template = DimensionTemplate::new("kg", "25".parse().unwrap());
        let dim = Dimension::from_template(&template, "50".parse().unwrap());

        assert_eq!(dim.id, template.id);
        assert_eq!(dim.label(), "25 kg");
    }
}

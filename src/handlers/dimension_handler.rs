//! Add Dimension Handler
//!
//! Adds a priced dimension to a material, either brand new or attached from
//! the dimension catalog.

use crate::domain::{Dimension, Material, OperationContext};
use crate::error::AppError;
use crate::store::Stores;

use super::{AddDimensionCommand, DimensionSource};

pub struct AddDimensionHandler {
    stores: Stores,
}

impl AddDimensionHandler {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn execute(
        &self,
        command: AddDimensionCommand,
        context: &OperationContext,
    ) -> Result<Material, AppError> {
        let dimension = match command.source {
            DimensionSource::New { metric, quantity } => {
                if metric.trim().is_empty() {
                    return Err(AppError::InvalidRequest("metric is required".to_string()));
                }
                Dimension::new(metric, quantity, command.price)
            }
            DimensionSource::Template(template_id) => {
                let template = self
                    .stores
                    .catalog
                    .get_template(template_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Dimension", template_id))?;
                Dimension::from_template(&template, command.price)
            }
        };

        let material = self
            .stores
            .materials
            .add_dimension(command.material_id, &dimension)
            .await?;

        tracing::info!(
            material_id = %material.id,
            dimension_id = %dimension.id,
            label = %dimension.label(),
            price = %dimension.price,
            correlation_id = ?context.correlation_id,
            "Dimension added to material"
        );

        Ok(material)
    }
}

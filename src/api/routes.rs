//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Budget, DimensionTemplate, DomainError, Material, OperationContext, Price, UnitSize};
use crate::error::AppError;
use crate::handlers::{
    AddDimensionCommand, AddDimensionHandler, AddMaterialToBudgetCommand,
    AddMaterialToBudgetHandler, CascadeReport, ChangeDimensionPriceCommand,
    ChangeDimensionPriceHandler, DeleteDimensionCommand, DeleteDimensionHandler,
    DeleteDimensionResult, RemoveBudgetLineCommand, RemoveBudgetLineHandler,
};
use crate::store::Stores;

// =========================================================================
// Request/Response types
// =========================================================================

/// Body for creating or renaming a material or budget
#[derive(Debug, Serialize, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddDimensionRequest {
    pub metric: String,
    pub quantity: Decimal,
    pub price: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddMaterialToBudgetRequest {
    /// Rendered dimension label, e.g. "25 kg"
    pub metric: String,
    pub quantity: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DimensionTemplateRequest {
    pub metric: String,
    pub quantity: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PriceRequest {
    pub price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct PriceChangeResponse {
    pub material: Material,
    pub cascade: CascadeReport,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: Uuid,
    pub deleted: bool,
}

fn required_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::BlankName.into());
    }
    Ok(name)
}

fn required_metric(metric: &str) -> Result<&str, AppError> {
    let metric = metric.trim();
    if metric.is_empty() {
        return Err(AppError::InvalidRequest("metric is required".to_string()));
    }
    Ok(metric)
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<Stores> {
    Router::new()
        // Materials
        .route("/materials", get(list_materials).post(create_material))
        .route(
            "/materials/:material_id",
            get(get_material).put(rename_material).delete(delete_material),
        )
        .route("/materials/:material_id/dimensions", post(add_dimension))
        .route(
            "/materials/:material_id/budgets/:budget_id",
            put(add_material_to_budget),
        )
        // Dimension catalog and propagation
        .route("/dimensions", get(list_dimensions).post(create_dimension))
        .route(
            "/dimensions/:dimension_id",
            get(get_dimension).put(update_dimension).delete(delete_dimension),
        )
        .route("/dimensions/:dimension_id/price", put(change_dimension_price))
        .route(
            "/dimensions/:dimension_id/materials/:material_id",
            put(attach_dimension),
        )
        .route("/dimensions/:dimension_id/materials", delete(detach_dimension))
        // Budgets
        .route("/budgets", get(list_budgets).post(create_budget))
        .route(
            "/budgets/:budget_id",
            get(get_budget).put(rename_budget).delete(delete_budget),
        )
        .route("/budgets/:budget_id/lines/:line_id", delete(remove_budget_line))
}

// =========================================================================
// Materials
// =========================================================================

async fn list_materials(State(stores): State<Stores>) -> Result<Json<Vec<Material>>, AppError> {
    Ok(Json(stores.materials.list_materials().await?))
}

async fn get_material(
    State(stores): State<Stores>,
    Path(material_id): Path<Uuid>,
) -> Result<Json<Material>, AppError> {
    let material = stores
        .materials
        .get_material(material_id)
        .await?
        .ok_or_else(|| AppError::not_found("Material", material_id))?;

    Ok(Json(material))
}

async fn create_material(
    State(stores): State<Stores>,
    Json(request): Json<NameRequest>,
) -> Result<(StatusCode, Json<Material>), AppError> {
    let material = stores
        .materials
        .create_material(required_name(&request.name)?)
        .await?;

    tracing::info!(material_id = %material.id, name = %material.name, "Material created");

    Ok((StatusCode::CREATED, Json(material)))
}

async fn rename_material(
    State(stores): State<Stores>,
    Path(material_id): Path<Uuid>,
    Json(request): Json<NameRequest>,
) -> Result<Json<Material>, AppError> {
    let material = stores
        .materials
        .rename_material(material_id, required_name(&request.name)?)
        .await?;

    Ok(Json(material))
}

/// Budgets keep their lines; their snapshots never referenced the material itself.
async fn delete_material(
    State(stores): State<Stores>,
    Path(material_id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, AppError> {
    stores.materials.delete_material(material_id).await?;

    tracing::info!(material_id = %material_id, "Material deleted");

    Ok(Json(DeletedResponse {
        id: material_id,
        deleted: true,
    }))
}

async fn add_dimension(
    State(stores): State<Stores>,
    Extension(context): Extension<OperationContext>,
    Path(material_id): Path<Uuid>,
    Json(request): Json<AddDimensionRequest>,
) -> Result<(StatusCode, Json<Material>), AppError> {
    let command = AddDimensionCommand::new_dimension(
        material_id,
        required_metric(&request.metric)?,
        UnitSize::new(request.quantity)?,
        Price::new(request.price)?,
    );

    let material = AddDimensionHandler::new(stores).execute(command, &context).await?;

    Ok((StatusCode::CREATED, Json(material)))
}

async fn add_material_to_budget(
    State(stores): State<Stores>,
    Extension(context): Extension<OperationContext>,
    Path((material_id, budget_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<AddMaterialToBudgetRequest>,
) -> Result<Json<Budget>, AppError> {
    let command =
        AddMaterialToBudgetCommand::new(budget_id, material_id, request.metric, request.quantity);

    let result = AddMaterialToBudgetHandler::new(stores)
        .execute(command, &context)
        .await?;

    Ok(Json(result.budget))
}

// =========================================================================
// Dimensions
// =========================================================================

async fn list_dimensions(
    State(stores): State<Stores>,
) -> Result<Json<Vec<DimensionTemplate>>, AppError> {
    Ok(Json(stores.catalog.list_templates().await?))
}

async fn get_dimension(
    State(stores): State<Stores>,
    Path(dimension_id): Path<Uuid>,
) -> Result<Json<DimensionTemplate>, AppError> {
    let template = stores
        .catalog
        .get_template(dimension_id)
        .await?
        .ok_or_else(|| AppError::not_found("Dimension", dimension_id))?;

    Ok(Json(template))
}

async fn create_dimension(
    State(stores): State<Stores>,
    Json(request): Json<DimensionTemplateRequest>,
) -> Result<(StatusCode, Json<DimensionTemplate>), AppError> {
    let template = stores
        .catalog
        .create_template(required_metric(&request.metric)?, UnitSize::new(request.quantity)?)
        .await?;

    tracing::info!(dimension_id = %template.id, "Dimension template created");

    Ok((StatusCode::CREATED, Json(template)))
}

/// Materials already carrying the dimension keep their own copy.
async fn update_dimension(
    State(stores): State<Stores>,
    Path(dimension_id): Path<Uuid>,
    Json(request): Json<DimensionTemplateRequest>,
) -> Result<Json<DimensionTemplate>, AppError> {
    let quantity = UnitSize::new(request.quantity)?;
    let template = stores
        .catalog
        .update_template(dimension_id, required_metric(&request.metric)?, quantity)
        .await?;

    Ok(Json(template))
}

async fn delete_dimension(
    State(stores): State<Stores>,
    Extension(context): Extension<OperationContext>,
    Path(dimension_id): Path<Uuid>,
) -> Result<Json<DeleteDimensionResult>, AppError> {
    let result = DeleteDimensionHandler::new(stores)
        .execute(DeleteDimensionCommand::new(dimension_id), &context)
        .await?;

    Ok(Json(result))
}

async fn detach_dimension(
    State(stores): State<Stores>,
    Extension(context): Extension<OperationContext>,
    Path(dimension_id): Path<Uuid>,
) -> Result<Json<DeleteDimensionResult>, AppError> {
    let result = DeleteDimensionHandler::new(stores)
        .execute(DeleteDimensionCommand::new(dimension_id).detach_only(), &context)
        .await?;

    Ok(Json(result))
}

async fn change_dimension_price(
    State(stores): State<Stores>,
    Extension(context): Extension<OperationContext>,
    Path(dimension_id): Path<Uuid>,
    Json(request): Json<PriceRequest>,
) -> Result<Json<PriceChangeResponse>, AppError> {
    let result = ChangeDimensionPriceHandler::new(stores)
        .execute(
            ChangeDimensionPriceCommand::new(dimension_id, Price::new(request.price)?),
            &context,
        )
        .await?;

    Ok(Json(PriceChangeResponse {
        material: result.material,
        cascade: result.cascade,
    }))
}

async fn attach_dimension(
    State(stores): State<Stores>,
    Extension(context): Extension<OperationContext>,
    Path((dimension_id, material_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<PriceRequest>,
) -> Result<Json<Material>, AppError> {
    let command =
        AddDimensionCommand::from_template(material_id, dimension_id, Price::new(request.price)?);

    let material = AddDimensionHandler::new(stores).execute(command, &context).await?;

    Ok(Json(material))
}

// =========================================================================
// Budgets
// =========================================================================

async fn list_budgets(State(stores): State<Stores>) -> Result<Json<Vec<Budget>>, AppError> {
    Ok(Json(stores.budgets.list_budgets().await?))
}

async fn get_budget(
    State(stores): State<Stores>,
    Path(budget_id): Path<Uuid>,
) -> Result<Json<Budget>, AppError> {
    let budget = stores
        .budgets
        .get_budget(budget_id)
        .await?
        .ok_or_else(|| AppError::not_found("Budget", budget_id))?;

    Ok(Json(budget))
}

async fn create_budget(
    State(stores): State<Stores>,
    Json(request): Json<NameRequest>,
) -> Result<(StatusCode, Json<Budget>), AppError> {
    let budget = stores
        .budgets
        .create_budget(required_name(&request.name)?)
        .await?;

    tracing::info!(budget_id = %budget.id, name = %budget.name, "Budget created");

    Ok((StatusCode::CREATED, Json(budget)))
}

async fn rename_budget(
    State(stores): State<Stores>,
    Path(budget_id): Path<Uuid>,
    Json(request): Json<NameRequest>,
) -> Result<Json<Budget>, AppError> {
    let budget = stores
        .budgets
        .rename_budget(budget_id, required_name(&request.name)?)
        .await?;

    Ok(Json(budget))
}

async fn delete_budget(
    State(stores): State<Stores>,
    Path(budget_id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, AppError> {
    stores.budgets.delete_budget(budget_id).await?;

    tracing::info!(budget_id = %budget_id, "Budget deleted");

    Ok(Json(DeletedResponse {
        id: budget_id,
        deleted: true,
    }))
}

async fn remove_budget_line(
    State(stores): State<Stores>,
    Extension(context): Extension<OperationContext>,
    Path((budget_id, line_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Budget>, AppError> {
    let result = RemoveBudgetLineHandler::new(stores)
        .execute(RemoveBudgetLineCommand::new(budget_id, line_id), &context)
        .await?;

    Ok(Json(result.budget))
}

//! budget_costing Library
//!
//! Re-exports modules for integration testing and the server binary.

pub mod api;
pub mod domain;
pub mod handlers;
pub mod store;

pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use error::{AppError, ErrorResponse};
pub use domain::{Budget, BudgetLine, Dimension, DomainError, Material, OperationContext, Price, UnitSize};
pub use store::{StoreError, Stores};

//! Domain module
//!
//! Core domain types and pricing rules.

pub mod budget;
pub mod context;
pub mod error;
pub mod material;
pub mod measure;

pub use budget::{line_price, total_price, Budget, BudgetLine, DimensionSnapshot, MARKUP_MULTIPLIER};
pub use context::OperationContext;
pub use error::DomainError;
pub use material::{render_label, Dimension, DimensionTemplate, Material};
pub use measure::{MeasureError, Price, UnitSize};

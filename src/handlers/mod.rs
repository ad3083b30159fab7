//! Command Handlers module
//!
//! The cost propagation engine. Each handler orchestrates independently
//! committed store writes for one operation.

mod commands;
mod budget_line_handler;
mod delete_dimension_handler;
mod dimension_handler;
mod price_change_handler;


pub use commands::*;
pub use budget_line_handler::{AddMaterialToBudgetHandler, RemoveBudgetLineHandler};
pub use delete_dimension_handler::DeleteDimensionHandler;
pub use dimension_handler::AddDimensionHandler;
pub use price_change_handler::ChangeDimensionPriceHandler;

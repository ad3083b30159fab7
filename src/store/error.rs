//! Store Errors
//!
//! Error types for material, budget and catalog store operations.

use std::time::Duration;
use uuid::Uuid;

/// Errors that can occur in a store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Identifier does not resolve
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// Duplicate material name or dimension already attached
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store call exceeded its deadline
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Persisted row violates a domain invariant
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

impl From<crate::domain::MeasureError> for StoreError {
    fn from(e: crate::domain::MeasureError) -> Self {
        StoreError::InvalidData(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

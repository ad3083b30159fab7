//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

use super::MeasureError;

/// Domain-specific errors
///
/// These errors represent rejected inputs and pricing rule failures.
/// They are independent of the web/infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// No dimension of the material renders to the requested label
    #[error("Metric mismatch: material '{material}' has no dimension labelled '{label}'")]
    MetricMismatch { material: String, label: String },

    /// Requested quantity for a budget line is zero
    #[error("Requested quantity cannot be zero")]
    ZeroQuantity,

    /// Unit size or price rejected at construction
    #[error(transparent)]
    InvalidMeasure(#[from] MeasureError),

    /// Price arithmetic left the representable range
    #[error("Price overflow: {0}")]
    PriceOverflow(String),

    /// Name is empty or whitespace only
    #[error("Name cannot be blank")]
    BlankName,
}

impl DomainError {
    /// Create a metric mismatch error
    pub fn metric_mismatch(material: impl Into<String>, label: impl Into<String>) -> Self {
        Self::MetricMismatch {
            material: material.into(),
            label: label.into(),
        }
    }

    /// Create an overflow error for a line price computation
    pub fn price_overflow(requested: Decimal, unit: Decimal, price: Decimal) -> Self {
        Self::PriceOverflow(format!("{} / {} * {}", requested, unit, price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_mismatch_error() {
        let err = DomainError::metric_mismatch("Flour", "10 kg");

        assert!(err.to_string().contains("Flour"));
        assert!(err.to_string().contains("10 kg"));
    }

    #[test]
    fn test_measure_error_is_transparent() {
        let err: DomainError = MeasureError::NotPositive(Decimal::ZERO).into();
        assert_eq!(err.to_string(), "Unit size must be positive (got 0)");
    }
}

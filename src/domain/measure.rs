//! Measure types
//!
//! Domain primitives for unit sizes and prices.
//! Both are validated at construction time, so a dimension can never carry
//! a zero unit size or a negative price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum allowed value for a unit size or a price
const MAX_VALUE: &str = "1000000000000";

/// Maximum decimal places (8)
const MAX_SCALE: u32 = 8;

/// Errors that can occur when creating a measure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeasureError {
    #[error("Unit size must be positive (got {0})")]
    NotPositive(Decimal),

    #[error("Price cannot be negative (got {0})")]
    Negative(Decimal),

    #[error("Too many decimal places (max {MAX_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("Value exceeds maximum allowed ({MAX_VALUE})")]
    Overflow,

    #[error("Invalid number format: {0}")]
    ParseError(String),
}

fn check_bounds(value: Decimal) -> Result<(), MeasureError> {
    if value.scale() > MAX_SCALE {
        return Err(MeasureError::TooManyDecimals(value.scale()));
    }

    let max = Decimal::from_str(MAX_VALUE).map_err(|e| MeasureError::ParseError(e.to_string()))?;
    if value > max {
        return Err(MeasureError::Overflow);
    }

    Ok(())
}

/// Quantity contained in one purchasable unit of a material (e.g. 25 for "25 kg").
///
/// # Invariants
/// - Value is always positive (> 0), so dividing by it is always defined
/// - Maximum 8 decimal places
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use budget_costing::domain::UnitSize;
///
/// let size = UnitSize::new(Decimal::new(25, 0)).unwrap();
/// assert_eq!(size.to_string(), "25");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct UnitSize(Decimal);

impl UnitSize {
    /// Create a new UnitSize with validation.
    pub fn new(value: Decimal) -> Result<Self, MeasureError> {
        if value <= Decimal::ZERO {
            return Err(MeasureError::NotPositive(value));
        }
        check_bounds(value)?;
        Ok(Self(value))
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

/// Renders the normalized value (25.00 -> "25", 2.50 -> "2.5").
impl fmt::Display for UnitSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl TryFrom<Decimal> for UnitSize {
    type Error = MeasureError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        UnitSize::new(value)
    }
}

impl From<UnitSize> for Decimal {
    fn from(size: UnitSize) -> Self {
        size.0
    }
}

impl FromStr for UnitSize {
    type Err = MeasureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s).map_err(|e| MeasureError::ParseError(e.to_string()))?;
        UnitSize::new(decimal)
    }
}

/// Cost of one purchasable unit. Zero is allowed, negative is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price with validation.
    pub fn new(value: Decimal) -> Result<Self, MeasureError> {
        if value < Decimal::ZERO {
            return Err(MeasureError::Negative(value));
        }
        check_bounds(value)?;
        Ok(Self(value))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = MeasureError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Price::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl FromStr for Price {
    type Err = MeasureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s).map_err(|e| MeasureError::ParseError(e.to_string()))?;
        Price::new(decimal)
    }
}

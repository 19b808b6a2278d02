//! Number of units held for a tracked instrument.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Decimal places kept for quantities.
pub const QUANTITY_SCALE: u32 = 2;

/// A non-negative holding size, always rounded to two decimal places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(Decimal);

impl Quantity {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Round `value` to two decimal places and wrap it.
    ///
    /// Rounding uses the banker's strategy, so `2.675` becomes `2.68` and
    /// `2.665` becomes `2.66`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NegativeQuantity`] for values below zero.
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ValidationError::NegativeQuantity);
        }
        Ok(Self(value.round_dp(QUANTITY_SCALE).normalize()))
    }

    /// Same as [`Quantity::new`] for a float coming from a form.
    ///
    /// Rounding works on the exact binary value of the float, so `2.675`
    /// (stored as `2.67499...`) becomes `2.67`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidQuantity`] for non-finite or
    /// out-of-range input and [`ValidationError::NegativeQuantity`] below zero.
    pub fn from_f64(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::InvalidQuantity);
        }
        let decimal = Decimal::from_f64_retain(value).ok_or(ValidationError::InvalidQuantity)?;
        Self::new(decimal)
    }

    #[must_use]
    pub fn value(self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Self::from_f64(raw).map_err(serde::de::Error::custom)
    }
}

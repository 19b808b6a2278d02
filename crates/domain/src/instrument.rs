//! A security tracked by a hub.

use serde::{Deserialize, Serialize};

use crate::error::{PocketError, ValidationError};
use crate::isin::Isin;
use crate::quantity::Quantity;

/// One tracked instrument: which security, how it is labelled, how much is held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedInstrument {
    pub isin: Isin,
    pub name: String,
    #[serde(default)]
    pub quantity: Quantity,
}

impl TrackedInstrument {
    /// Build an instrument, trimming the display name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when the name is blank.
    pub fn new(
        isin: Isin,
        name: impl Into<String>,
        quantity: Quantity,
    ) -> Result<Self, PocketError> {
        let instrument = Self {
            isin,
            name: name.into().trim().to_string(),
            quantity,
        };
        instrument.validate()?;
        Ok(instrument)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when the name is blank.
    pub fn validate(&self) -> Result<(), PocketError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    /// Stable per-hub identifier of the sensor that tracks this instrument.
    #[must_use]
    pub fn unique_id(&self) -> String {
        self.isin.as_str().to_ascii_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn isin() -> Isin {
        Isin::parse("DE0005140008").unwrap()
    }

    #[test]
    fn should_trim_name() {
        let inst = TrackedInstrument::new(isin(), "  Deutsche Bank ", Quantity::ZERO).unwrap();
        assert_eq!(inst.name, "Deutsche Bank");
    }

    #[test]
    fn should_reject_blank_name() {
        let result = TrackedInstrument::new(isin(), "   ", Quantity::ZERO);
        assert!(matches!(
            result,
            Err(PocketError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_use_upper_case_isin_as_unique_id() {
        let inst = TrackedInstrument::new(isin(), "DB", Quantity::ZERO).unwrap();
        assert_eq!(inst.unique_id(), "DE0005140008");
    }

    #[test]
    fn should_default_quantity_when_missing_in_json() {
        let inst: TrackedInstrument =
            serde_json::from_str(r#"{"isin":"DE0005140008","name":"DB"}"#).unwrap();
        assert!(inst.quantity.is_zero());

        let inst: TrackedInstrument =
            serde_json::from_str(r#"{"isin":"DE0005140008","name":"DB","quantity":2.5}"#)
                .unwrap();
        assert_eq!(inst.quantity.value(), dec!(2.5));
    }
}

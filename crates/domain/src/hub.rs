//! Hub: a named portfolio created by the setup flow.
//!
//! A hub owns the list of instruments it tracks. Every instrument becomes one
//! price sensor entity once the hub is set up.

use serde::{Deserialize, Serialize};

use crate::error::{NotFoundError, PocketError, ValidationError};
use crate::id::HubId;
use crate::instrument::TrackedInstrument;
use crate::isin::Isin;
use crate::quantity::Quantity;
use crate::time::{Timestamp, now};

/// A named list of tracked instruments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hub {
    pub id: HubId,
    pub name: String,
    pub instruments: Vec<TrackedInstrument>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Hub {
    /// Create a builder for constructing a [`Hub`].
    #[must_use]
    pub fn builder() -> HubBuilder {
        HubBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PocketError::Validation`] when the name is blank, an
    /// instrument is invalid, or an ISIN appears twice.
    pub fn validate(&self) -> Result<(), PocketError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        for (idx, inst) in self.instruments.iter().enumerate() {
            inst.validate()?;
            if self.instruments[..idx].iter().any(|o| o.isin == inst.isin) {
                return Err(ValidationError::DuplicateIsin(inst.isin.to_string()).into());
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, isin: &Isin) -> bool {
        self.instrument(isin).is_some()
    }

    #[must_use]
    pub fn instrument(&self, isin: &Isin) -> Option<&TrackedInstrument> {
        self.instruments.iter().find(|inst| &inst.isin == isin)
    }

    /// Instruments ordered by display name, ignoring case.
    #[must_use]
    pub fn instruments_sorted_by_name(&self) -> Vec<&TrackedInstrument> {
        let mut sorted: Vec<_> = self.instruments.iter().collect();
        sorted.sort_by_key(|inst| inst.name.to_lowercase());
        sorted
    }

    /// Append an instrument.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateIsin`] when the ISIN is already tracked.
    pub fn add_instrument(&mut self, instrument: TrackedInstrument) -> Result<(), PocketError> {
        instrument.validate()?;
        if self.contains(&instrument.isin) {
            return Err(ValidationError::DuplicateIsin(instrument.isin.to_string()).into());
        }
        self.instruments.push(instrument);
        self.updated_at = now();
        Ok(())
    }

    /// Change the held quantity of a tracked instrument.
    ///
    /// # Errors
    ///
    /// Returns [`PocketError::NotFound`] when the ISIN is not tracked.
    pub fn set_quantity(&mut self, isin: &Isin, quantity: Quantity) -> Result<(), PocketError> {
        let inst = self
            .instruments
            .iter_mut()
            .find(|inst| &inst.isin == isin)
            .ok_or_else(|| instrument_not_found(isin))?;
        inst.quantity = quantity;
        self.updated_at = now();
        Ok(())
    }

    /// Stop tracking an instrument, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`PocketError::NotFound`] when the ISIN is not tracked.
    pub fn remove_instrument(&mut self, isin: &Isin) -> Result<TrackedInstrument, PocketError> {
        let idx = self
            .instruments
            .iter()
            .position(|inst| &inst.isin == isin)
            .ok_or_else(|| instrument_not_found(isin))?;
        self.updated_at = now();
        Ok(self.instruments.remove(idx))
    }
}

fn instrument_not_found(isin: &Isin) -> PocketError {
    NotFoundError {
        entity: "Instrument",
        id: isin.to_string(),
    }
    .into()
}

/// Step-by-step builder for [`Hub`].
#[derive(Debug, Default)]
pub struct HubBuilder {
    id: Option<HubId>,
    name: Option<String>,
    instruments: Vec<TrackedInstrument>,
}

impl HubBuilder {
    #[must_use]
    pub fn id(mut self, id: HubId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn instrument(mut self, instrument: TrackedInstrument) -> Self {
        self.instruments.push(instrument);
        self
    }

    #[must_use]
    pub fn instruments(mut self, instruments: Vec<TrackedInstrument>) -> Self {
        self.instruments = instruments;
        self
    }

    /// Consume the builder and produce a validated [`Hub`].
    ///
    /// # Errors
    ///
    /// Returns [`PocketError::Validation`] if invariants are not met.
    pub fn build(self) -> Result<Hub, PocketError> {
        let ts = now();
        let hub = Hub {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default().trim().to_string(),
            instruments: self.instruments,
            created_at: ts,
            updated_at: ts,
        };
        hub.validate()?;
        Ok(hub)
    }
}

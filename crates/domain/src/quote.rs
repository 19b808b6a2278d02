//! Quote: one market data snapshot for an instrument, and the mapping of
//! that snapshot onto sensor attributes.
//!
//! The provider answers with a flat JSON object (`price`, `currency`, `bid`,
//! `ask`, …) plus a nested `instrumentType.mainType` discriminator. Which
//! fields end up as attributes depends on that discriminator.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::AttributeValue;
use crate::quantity::Quantity;

/// Attribute key carrying the held quantity.
pub const QUANTITY_ATTRIBUTE: &str = "quantity";
/// Attribute key carrying `price * quantity`.
pub const TOTAL_VALUE_ATTRIBUTE: &str = "total_value";

const SHARE_KEYS: &[&str] = &[
    "name",
    "instrumentTypeDisplayName",
    "close",
    "changePercent",
    "changeAbsolute",
    "bid",
    "bidDate",
    "ask",
    "askDate",
    "wkn",
    "isin",
    "internalIsin",
    "stockMarket",
    "priceChangeDate",
    "currency",
    "currencySign",
];

const FUND_KEYS: &[&str] = &[
    "name",
    "instrumentTypeDisplayName",
    "close",
    "changePercent",
    "changeAbsolute",
    "wkn",
    "isin",
    "internalIsin",
    "stockMarket",
    "priceChangeDate",
    "currency",
    "currencySign",
];

const BOND_KEYS: &[&str] = &[
    "name",
    "instrumentTypeDisplayName",
    "bid",
    "bidDate",
    "ask",
    "askDate",
    "wkn",
    "isin",
    "internalIsin",
    "stockMarket",
    "priceChangeDate",
    "currency",
    "currencySign",
];

const OTHER_KEYS: &[&str] = &[
    "name",
    "currency",
    "priceChangeDate",
    "wkn",
    "isin",
    "internalIsin",
    "stockMarket",
    "currencySign",
];

/// Kind of security, taken from `instrumentType.mainType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentType {
    Share,
    /// Funds and ETFs.
    Fund,
    Bond,
    /// Anything else (certificates, warrants, …) or a missing discriminator.
    Other(String),
}

impl InstrumentType {
    #[must_use]
    pub fn from_main_type(main_type: &str) -> Self {
        match main_type {
            "Share" => Self::Share,
            "Fund" => Self::Fund,
            "Bond" => Self::Bond,
            other => Self::Other(other.to_string()),
        }
    }

    /// Payload keys copied into the sensor attributes for this kind.
    #[must_use]
    pub fn attribute_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Share => SHARE_KEYS,
            Self::Fund => FUND_KEYS,
            Self::Bond => BOND_KEYS,
            Self::Other(_) => OTHER_KEYS,
        }
    }
}

/// Why a provider payload cannot be turned into a [`Quote`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload has no price")]
    MissingPrice,

    #[error("price {0} is not a decimal number")]
    InvalidPrice(String),
}

/// A decoded market data snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    price: Option<Decimal>,
    instrument_type: InstrumentType,
    payload: Map<String, Value>,
}

impl Quote {
    /// Decode a provider payload.
    ///
    /// The `price` key must be present. A `null` price is accepted and
    /// leaves the sensor in the unknown state.
    ///
    /// # Errors
    ///
    /// Returns a [`QuoteError`] when the payload is not an object, has no
    /// `price` key, or the price is not numeric.
    pub fn from_payload(payload: Value) -> Result<Self, QuoteError> {
        let Value::Object(payload) = payload else {
            return Err(QuoteError::NotAnObject);
        };
        let price = match payload.get("price") {
            None => return Err(QuoteError::MissingPrice),
            Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(parse_decimal(&n.to_string())?),
            Some(Value::String(s)) => Some(parse_decimal(s)?),
            Some(other) => return Err(QuoteError::InvalidPrice(other.to_string())),
        };
        let instrument_type = payload
            .get("instrumentType")
            .and_then(|it| it.get("mainType"))
            .and_then(Value::as_str)
            .map_or_else(
                || InstrumentType::Other(String::new()),
                InstrumentType::from_main_type,
            );

        Ok(Self {
            price,
            instrument_type,
            payload,
        })
    }

    #[must_use]
    pub fn price(&self) -> Option<Decimal> {
        self.price
    }

    #[must_use]
    pub fn instrument_type(&self) -> &InstrumentType {
        &self.instrument_type
    }

    /// Currency code, used as the sensor's unit of measurement.
    #[must_use]
    pub fn currency(&self) -> Option<&str> {
        self.payload.get("currency").and_then(Value::as_str)
    }

    /// Raw payload field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Holding value `price * quantity`, when a price is known.
    #[must_use]
    pub fn total_value(&self, quantity: Quantity) -> Option<Decimal> {
        self.price.map(|price| price * quantity.value())
    }

    /// Attribute map for a sensor holding `quantity` units.
    ///
    /// Keys listed by [`InstrumentType::attribute_keys`] are copied from the
    /// payload (`null` when absent), followed by `quantity` and `total_value`.
    #[must_use]
    pub fn attributes(&self, quantity: Quantity) -> HashMap<String, AttributeValue> {
        let keys = self.instrument_type.attribute_keys();
        let mut attributes = HashMap::with_capacity(keys.len() + 2);
        for &key in keys {
            let value = self
                .payload
                .get(key)
                .cloned()
                .map_or_else(AttributeValue::null, AttributeValue::from);
            attributes.insert(key.to_string(), value);
        }
        attributes.insert(
            QUANTITY_ATTRIBUTE.to_string(),
            AttributeValue::from_decimal(quantity.value()),
        );
        attributes.insert(
            TOTAL_VALUE_ATTRIBUTE.to_string(),
            self.total_value(quantity)
                .map_or_else(AttributeValue::null, AttributeValue::from_decimal),
        );
        attributes
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal, QuoteError> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| QuoteError::InvalidPrice(raw.to_string()))
}

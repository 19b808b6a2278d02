//! Entity state: what a price sensor currently reports.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// State of a price sensor.
///
/// Rendered as `"unknown"`, `"unavailable"`, or the price as a decimal
/// string, both in JSON and in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EntityState {
    #[default]
    Unknown,
    Unavailable,
    Price(Decimal),
}

impl EntityState {
    /// Whether the entity is reachable (anything but [`Unavailable`](Self::Unavailable)).
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }

    /// The price, when one is known.
    #[must_use]
    pub fn price(&self) -> Option<Decimal> {
        match self {
            Self::Price(value) => Some(*value),
            Self::Unknown | Self::Unavailable => None,
        }
    }
}

impl From<Option<Decimal>> for EntityState {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(Self::Unknown, Self::Price)
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Unavailable => f.write_str("unavailable"),
            Self::Price(value) => value.fmt(f),
        }
    }
}

/// The string is neither a keyword nor a decimal number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entity state {0:?}")]
pub struct ParseStateError(String);

impl FromStr for EntityState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(Self::Unknown),
            "unavailable" => Ok(Self::Unavailable),
            other => Decimal::from_str(other)
                .map(Self::Price)
                .map_err(|_| ParseStateError(other.to_string())),
        }
    }
}

impl From<EntityState> for String {
    fn from(value: EntityState) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for EntityState {
    type Error = ParseStateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn should_default_to_unknown() {
        assert_eq!(EntityState::default(), EntityState::Unknown);
    }

    #[test]
    fn should_report_unavailable_when_state_is_unavailable() {
        assert!(!EntityState::Unavailable.is_available());
        assert!(EntityState::Price(dec!(1)).is_available());
    }

    #[test]
    fn should_display_price_as_decimal_string() {
        assert_eq!(EntityState::Price(dec!(182.52)).to_string(), "182.52");
        assert_eq!(EntityState::Unknown.to_string(), "unknown");
    }

    #[test]
    fn should_parse_keywords_and_prices() {
        assert_eq!("unavailable".parse(), Ok(EntityState::Unavailable));
        assert_eq!("99.9".parse(), Ok(EntityState::Price(dec!(99.9))));
        assert!("on".parse::<EntityState>().is_err());
    }

    #[test]
    fn should_map_missing_price_to_unknown() {
        assert_eq!(EntityState::from(None), EntityState::Unknown);
        assert_eq!(
            EntityState::from(Some(dec!(3))),
            EntityState::Price(dec!(3))
        );
    }

    #[test]
    fn should_serialize_as_json_string() {
        let json = serde_json::to_string(&EntityState::Price(dec!(12.5))).unwrap();
        assert_eq!(json, "\"12.5\"");
        let parsed: EntityState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, EntityState::Price(dec!(12.5)));
    }
}

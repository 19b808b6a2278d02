//! International Securities Identification Number.
//!
//! An ISIN is 12 characters: a 2-letter country prefix, a 9-character
//! alphanumeric national code and a single check digit. Letters count as
//! `10..=35` when the check digit is computed with the Luhn scheme.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length of every ISIN.
pub const ISIN_LEN: usize = 12;

/// Why a string is not a valid ISIN.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IsinError {
    #[error("expected {ISIN_LEN} characters, got {0}")]
    WrongLength(usize),

    #[error("country prefix must be two letters")]
    InvalidCountry,

    #[error("unexpected character {0:?}")]
    InvalidCharacter(char),

    #[error("check digit mismatch, expected {expected}")]
    ChecksumMismatch { expected: u8 },
}

/// A validated, upper-cased ISIN.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Isin(String);

impl Isin {
    /// Parse user input into an ISIN.
    ///
    /// Surrounding whitespace is ignored and letters are upper-cased before
    /// the structure and the check digit are verified.
    ///
    /// # Errors
    ///
    /// Returns an [`IsinError`] describing the first problem found.
    pub fn parse(raw: &str) -> Result<Self, IsinError> {
        let value = raw.trim().to_ascii_uppercase();
        let count = value.chars().count();
        if count != ISIN_LEN {
            return Err(IsinError::WrongLength(count));
        }
        if let Some(bad) = value.chars().find(|c| !c.is_ascii()) {
            return Err(IsinError::InvalidCharacter(bad));
        }

        let bytes = value.as_bytes();
        if !bytes[..2].iter().all(u8::is_ascii_uppercase) {
            return Err(IsinError::InvalidCountry);
        }
        if let Some(bad) = value[2..11].chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(IsinError::InvalidCharacter(bad));
        }
        let last = char::from(bytes[11]);
        let Some(actual) = last.to_digit(10) else {
            return Err(IsinError::InvalidCharacter(last));
        };

        let expected = check_digit(&value[..11]);
        if u32::from(expected) != actual {
            return Err(IsinError::ChecksumMismatch { expected });
        }

        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-letter country prefix.
    #[must_use]
    pub fn country(&self) -> &str {
        &self.0[..2]
    }
}

/// Luhn check digit over the base-36 expansion of `body`.
///
/// `body` must be the first 11 upper-case alphanumeric characters.
fn check_digit(body: &str) -> u8 {
    let mut digits = Vec::with_capacity(22);
    for c in body.chars() {
        // alphanumeric was checked by the caller
        let value = c.to_digit(36).unwrap_or_default();
        if value >= 10 {
            digits.push(value / 10);
        }
        digits.push(value % 10);
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(idx, &d)| {
            if idx % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();

    // always < 10
    u8::try_from((10 - sum % 10) % 10).unwrap_or_default()
}

impl fmt::Display for Isin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Isin {
    type Err = IsinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Isin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Isin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Isin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

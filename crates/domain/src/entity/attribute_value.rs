//! Typed attribute values attached to entities.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Json(serde_json::Value),
}

impl AttributeValue {
    /// Null, used for attributes the provider did not send.
    #[must_use]
    pub fn null() -> Self {
        Self::Json(serde_json::Value::Null)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Json(serde_json::Value::Null))
    }

    /// Convert a decimal amount, falling back to its string form when it
    /// does not fit an `f64`.
    #[must_use]
    pub fn from_decimal(value: Decimal) -> Self {
        value
            .to_f64()
            .map_or_else(|| Self::String(value.to_string()), Self::Float)
    }
}

impl From<serde_json::Value> for AttributeValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Json(serde_json::Value::Number(n))),
            serde_json::Value::String(s) => Self::String(s),
            other => Self::Json(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn should_serialize_string_variant_as_plain_string() {
        let val = AttributeValue::String("EUR".to_string());
        assert_eq!(serde_json::to_string(&val).unwrap(), "\"EUR\"");
    }

    #[test]
    fn should_serialize_null_as_json_null() {
        assert_eq!(serde_json::to_string(&AttributeValue::null()).unwrap(), "null");
        assert!(AttributeValue::null().is_null());
    }

    #[test]
    fn should_convert_json_scalars_into_typed_variants() {
        assert_eq!(
            AttributeValue::from(serde_json::json!(42)),
            AttributeValue::Int(42)
        );
        assert_eq!(
            AttributeValue::from(serde_json::json!(-0.61)),
            AttributeValue::Float(-0.61)
        );
        assert_eq!(
            AttributeValue::from(serde_json::json!("XETRA")),
            AttributeValue::String("XETRA".to_string())
        );
        assert!(matches!(
            AttributeValue::from(serde_json::json!({"mainType": "Share"})),
            AttributeValue::Json(_)
        ));
    }

    #[test]
    fn should_convert_decimal_to_float() {
        assert_eq!(
            AttributeValue::from_decimal(dec!(1825.5)),
            AttributeValue::Float(1825.5)
        );
    }

    #[test]
    fn should_deserialize_json_object_as_json_variant() {
        let val: AttributeValue = serde_json::from_str(r#"{"nested": "value"}"#).unwrap();
        assert!(matches!(val, AttributeValue::Json(_)));
    }
}

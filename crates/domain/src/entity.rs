//! Entity: the price sensor exposed for one tracked instrument.
//!
//! Each instrument of a loaded hub is backed by exactly one entity. The
//! entity carries the last known price as its state, the quote currency as
//! unit, and the instrument-type dependent attributes of the last quote.

mod attribute_value;
mod state;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use attribute_value::AttributeValue;
pub use state::{EntityState, ParseStateError};

use crate::error::{PocketError, ValidationError};
use crate::id::{EntityId, HubId};
use crate::quantity::Quantity;
use crate::quote::Quote;
use crate::time::{Timestamp, now};

/// Domain prefix of every entity id.
pub const SENSOR_DOMAIN: &str = "sensor";

/// A price sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub hub_id: HubId,
    /// Upper-cased ISIN, unique within a hub.
    pub unique_id: String,
    /// Human readable id such as `sensor.depot_apple`.
    pub entity_id: String,
    pub friendly_name: String,
    pub state: EntityState,
    pub unit: Option<String>,
    pub attributes: HashMap<String, AttributeValue>,
    pub last_changed: Timestamp,
    pub last_updated: Timestamp,
}

impl Entity {
    /// Create a builder for constructing an [`Entity`].
    #[must_use]
    pub fn builder() -> EntityBuilder {
        EntityBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PocketError::Validation`] when `entity_id` or
    /// `friendly_name` is empty.
    pub fn validate(&self) -> Result<(), PocketError> {
        if self.entity_id.trim().is_empty() || self.unique_id.trim().is_empty() {
            return Err(ValidationError::EmptyEntityId.into());
        }
        if self.friendly_name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    /// Apply a freshly fetched quote.
    ///
    /// Replaces state, unit and attributes. `last_changed` only moves when
    /// the state value differs; `last_updated` always moves. Returns whether
    /// the state changed.
    pub fn apply_quote(&mut self, quote: &Quote, quantity: Quantity, at: Timestamp) -> bool {
        let next = EntityState::from(quote.price());
        let changed = next != self.state;
        self.state = next;
        self.unit = quote.currency().map(str::to_string);
        self.attributes = quote.attributes(quantity);
        if changed {
            self.last_changed = at;
        }
        self.last_updated = at;
        changed
    }

    #[must_use]
    pub fn get_attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }
}

/// Display name of the sensor tracking `instrument_name` in `hub_name`.
#[must_use]
pub fn friendly_name(hub_name: &str, instrument_name: &str) -> String {
    format!("{hub_name} - {instrument_name}")
}

/// Base entity id for an instrument, before collision suffixing.
#[must_use]
pub fn base_entity_id(hub_name: &str, instrument_name: &str) -> String {
    format!(
        "{SENSOR_DOMAIN}.{}_{}",
        slugify(hub_name),
        slugify(instrument_name)
    )
}

/// `base`, or `base_2`, `base_3`, … until `taken` says it is free.
pub fn unique_entity_id(base: &str, mut taken: impl FnMut(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (2_u32..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Lower-case ASCII alphanumerics joined by single underscores.
///
/// Common Latin accents are folded first so `Überweisung` becomes
/// `uberweisung`. An input with nothing left yields `unknown`.
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_sep = false;
    for c in input.chars().flat_map(fold_accent) {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("unknown");
    }
    slug
}

fn fold_accent(c: char) -> impl Iterator<Item = char> {
    let folded: &[char] = match c {
        'ä' | 'Ä' | 'à' | 'á' | 'â' | 'À' | 'Á' | 'Â' => &['a'],
        'ö' | 'Ö' | 'ò' | 'ó' | 'ô' | 'Ò' | 'Ó' | 'Ô' => &['o'],
        'ü' | 'Ü' | 'ù' | 'ú' | 'û' | 'Ù' | 'Ú' | 'Û' => &['u'],
        'é' | 'è' | 'ê' | 'É' | 'È' | 'Ê' => &['e'],
        'ß' => &['s', 's'],
        _ => &[],
    };
    let passthrough = folded.is_empty().then_some(c);
    folded.iter().copied().chain(passthrough)
}

/// Step-by-step builder for [`Entity`].
#[derive(Debug, Default)]
pub struct EntityBuilder {
    id: Option<EntityId>,
    hub_id: Option<HubId>,
    unique_id: Option<String>,
    entity_id: Option<String>,
    friendly_name: Option<String>,
    state: EntityState,
    unit: Option<String>,
    attributes: HashMap<String, AttributeValue>,
}

impl EntityBuilder {
    #[must_use]
    pub fn id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn hub_id(mut self, hub_id: HubId) -> Self {
        self.hub_id = Some(hub_id);
        self
    }

    #[must_use]
    pub fn unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    #[must_use]
    pub fn entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn friendly_name(mut self, friendly_name: impl Into<String>) -> Self {
        self.friendly_name = Some(friendly_name.into());
        self
    }

    #[must_use]
    pub fn state(mut self, state: EntityState) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Consume the builder, validate, and return an [`Entity`].
    ///
    /// # Errors
    ///
    /// Returns [`PocketError::Validation`] if an identifier or the name is
    /// missing.
    pub fn build(self) -> Result<Entity, PocketError> {
        let ts = now();
        let entity = Entity {
            id: self.id.unwrap_or_default(),
            hub_id: self.hub_id.unwrap_or_default(),
            unique_id: self.unique_id.unwrap_or_default().to_ascii_uppercase(),
            entity_id: self.entity_id.unwrap_or_default(),
            friendly_name: self.friendly_name.unwrap_or_default(),
            state: self.state,
            unit: self.unit,
            attributes: self.attributes,
            last_changed: ts,
            last_updated: ts,
        };
        entity.validate()?;
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::{QUANTITY_ATTRIBUTE, TOTAL_VALUE_ATTRIBUTE};
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn sensor() -> Entity {
        Entity::builder()
            .unique_id("us0378331005")
            .entity_id("sensor.depot_apple")
            .friendly_name("Depot - Apple")
            .build()
            .unwrap()
    }

    fn quote(price: serde_json::Value) -> Quote {
        Quote::from_payload(json!({
            "price": price,
            "currency": "EUR",
            "instrumentType": {"mainType": "Share"}
        }))
        .unwrap()
    }

    #[test]
    fn should_build_entity_with_unknown_state() {
        let entity = sensor();
        assert_eq!(entity.state, EntityState::Unknown);
        assert_eq!(entity.unique_id, "US0378331005");
        assert_eq!(entity.last_changed, entity.last_updated);
    }

    #[test]
    fn should_reject_missing_entity_id() {
        let result = Entity::builder()
            .unique_id("US0378331005")
            .friendly_name("x")
            .build();
        assert!(matches!(
            result,
            Err(PocketError::Validation(ValidationError::EmptyEntityId))
        ));
    }

    #[test]
    fn should_reject_missing_friendly_name() {
        let result = Entity::builder()
            .unique_id("US0378331005")
            .entity_id("sensor.a_b")
            .build();
        assert!(matches!(
            result,
            Err(PocketError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_apply_quote_and_bump_last_changed_on_new_price() {
        let mut entity = sensor();
        let at = entity.last_updated + Duration::seconds(10);

        let changed = entity.apply_quote(&quote(json!(100.25)), Quantity::new(dec!(2)).unwrap(), at);

        assert!(changed);
        assert_eq!(entity.state, EntityState::Price(dec!(100.25)));
        assert_eq!(entity.unit.as_deref(), Some("EUR"));
        assert_eq!(entity.last_changed, at);
        assert_eq!(entity.last_updated, at);
        assert_eq!(
            entity.get_attribute(TOTAL_VALUE_ATTRIBUTE),
            Some(&AttributeValue::Float(200.5))
        );
        assert_eq!(
            entity.get_attribute(QUANTITY_ATTRIBUTE),
            Some(&AttributeValue::Float(2.0))
        );
    }

    #[test]
    fn should_keep_last_changed_when_price_is_unchanged() {
        let mut entity = sensor();
        let first = entity.last_updated + Duration::seconds(10);
        let second = first + Duration::seconds(10);
        entity.apply_quote(&quote(json!(5)), Quantity::ZERO, first);

        let changed = entity.apply_quote(&quote(json!(5)), Quantity::ZERO, second);

        assert!(!changed);
        assert_eq!(entity.last_changed, first);
        assert_eq!(entity.last_updated, second);
    }

    #[test]
    fn should_go_unknown_on_null_price() {
        let mut entity = sensor();
        entity.state = EntityState::Price(dec!(1));
        let changed = entity.apply_quote(&quote(json!(null)), Quantity::ZERO, now());
        assert!(changed);
        assert_eq!(entity.state, EntityState::Unknown);
    }

    #[test]
    fn should_slugify_names() {
        assert_eq!(slugify("My Depot"), "my_depot");
        assert_eq!(slugify("  Apple Inc.  "), "apple_inc");
        assert_eq!(slugify("Müller & Söhne"), "muller_sohne");
        assert_eq!(slugify("Straße"), "strasse");
        assert_eq!(slugify("---"), "unknown");
    }

    #[test]
    fn should_build_entity_id_and_friendly_name() {
        assert_eq!(base_entity_id("My Depot", "Apple"), "sensor.my_depot_apple");
        assert_eq!(friendly_name("My Depot", "Apple"), "My Depot - Apple");
    }

    #[test]
    fn should_suffix_entity_id_on_collision() {
        let taken = ["sensor.a_b", "sensor.a_b_2"];
        assert_eq!(
            unique_entity_id("sensor.a_b", |c| taken.contains(&c)),
            "sensor.a_b_3"
        );
        assert_eq!(unique_entity_id("sensor.x", |_| false), "sensor.x");
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let mut entity = sensor();
        entity.apply_quote(&quote(json!(12.5)), Quantity::ZERO, now());
        let json = serde_json::to_string(&entity).unwrap();
        let parsed: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.state, entity.state);
        assert_eq!(parsed.entity_id, entity.entity_id);
    }
}

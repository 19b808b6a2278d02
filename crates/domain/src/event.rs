//! Event: an immutable record of something that happened.
//!
//! Events are produced when a sensor price changes, when sensors are
//! registered or removed, and when hubs are loaded, unloaded or removed.

use serde::{Deserialize, Serialize};

use crate::id::{EntityId, EventId};
use crate::time::{Timestamp, now};

/// What kind of thing happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    StateChanged,
    EntityCreated,
    EntityRemoved,
    HubLoaded,
    HubUnloaded,
    HubRemoved,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::StateChanged => "state_changed",
            Self::EntityCreated => "entity_created",
            Self::EntityRemoved => "entity_removed",
            Self::HubLoaded => "hub_loaded",
            Self::HubUnloaded => "hub_unloaded",
            Self::HubRemoved => "hub_removed",
        })
    }
}

/// A domain event, broadcast to subscribers such as the SSE stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    /// Entity the event is about, if any.
    pub entity_id: Option<EntityId>,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl Event {
    #[must_use]
    pub fn new(event_type: EventType, entity_id: Option<EntityId>, data: serde_json::Value) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            entity_id,
            data,
            timestamp: now(),
        }
    }
}

//! Registry of loaded hubs.
//!
//! A hub is *loaded* between a successful setup and its unload. Only loaded
//! hubs are polled. The registry keeps a snapshot of each loaded hub's name
//! and instruments, so a refresh knows the quantity held without a storage
//! round-trip.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::RwLock;

use pockethub_domain::hub::Hub;
use pockethub_domain::id::HubId;
use pockethub_domain::instrument::TrackedInstrument;
use pockethub_domain::quantity::Quantity;

/// Snapshot of a loaded hub.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedHub {
    pub id: HubId,
    pub name: String,
    pub instruments: Vec<TrackedInstrument>,
}

impl LoadedHub {
    /// Quantity held for the instrument whose unique id is `unique_id`.
    #[must_use]
    pub fn quantity_of(&self, unique_id: &str) -> Option<Quantity> {
        self.instruments
            .iter()
            .find(|inst| inst.unique_id() == unique_id)
            .map(|inst| inst.quantity)
    }

    /// JSON payload attached to hub lifecycle events.
    #[must_use]
    pub fn event_data(&self) -> serde_json::Value {
        json!({
            "hub_id": self.id.to_string(),
            "name": self.name,
            "instruments": self.instruments.len(),
        })
    }
}

impl From<&Hub> for LoadedHub {
    fn from(hub: &Hub) -> Self {
        Self {
            id: hub.id,
            name: hub.name.clone(),
            instruments: hub.instruments.clone(),
        }
    }
}

/// Shared, cloneable set of loaded hubs.
#[derive(Debug, Clone, Default)]
pub struct HubRegistry {
    inner: Arc<RwLock<HashMap<HubId, LoadedHub>>>,
}

impl HubRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `hub`, replacing a previous snapshot.
    pub async fn insert(&self, hub: LoadedHub) {
        self.inner.write().await.insert(hub.id, hub);
    }

    pub async fn remove(&self, id: HubId) -> Option<LoadedHub> {
        self.inner.write().await.remove(&id)
    }

    pub async fn get(&self, id: HubId) -> Option<LoadedHub> {
        self.inner.read().await.get(&id).cloned()
    }

    pub async fn is_loaded(&self, id: HubId) -> bool {
        self.inner.read().await.contains_key(&id)
    }

    /// All loaded hubs, ordered by name.
    pub async fn all(&self) -> Vec<LoadedHub> {
        let mut hubs: Vec<_> = self.inner.read().await.values().cloned().collect();
        hubs.sort_by(|a, b| a.name.cmp(&b.name));
        hubs
    }
}

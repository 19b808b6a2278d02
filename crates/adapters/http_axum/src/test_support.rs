//! In-memory adapters and request helpers for the router tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Method, Request, header};
use serde_json::{Value, json};

use pockethub_app::event_bus::InProcessEventBus;
use pockethub_app::ports::{EntityRepository, HubRepository, QuoteSource};
use pockethub_domain::entity::Entity;
use pockethub_domain::error::{ConflictError, PocketError};
use pockethub_domain::hub::Hub;
use pockethub_domain::id::{EntityId, HubId};
use pockethub_domain::isin::Isin;
use pockethub_domain::quote::Quote;

use crate::state::AppState;

pub const APPLE: &str = "US0378331005";

#[derive(Default)]
pub struct MemHubs(Mutex<HashMap<HubId, Hub>>);

impl HubRepository for MemHubs {
    async fn create(&self, hub: Hub) -> Result<Hub, PocketError> {
        let mut hubs = self.0.lock().unwrap();
        if hubs.values().any(|h| h.name == hub.name) {
            return Err(ConflictError {
                entity: "Hub",
                key: hub.name,
            }
            .into());
        }
        hubs.insert(hub.id, hub.clone());
        Ok(hub)
    }
    async fn get_by_id(&self, id: HubId) -> Result<Option<Hub>, PocketError> {
        Ok(self.0.lock().unwrap().get(&id).cloned())
    }
    async fn find_by_name(&self, name: &str) -> Result<Option<Hub>, PocketError> {
        Ok(self.0.lock().unwrap().values().find(|h| h.name == name).cloned())
    }
    async fn get_all(&self) -> Result<Vec<Hub>, PocketError> {
        Ok(self.0.lock().unwrap().values().cloned().collect())
    }
    async fn update(&self, hub: Hub) -> Result<Hub, PocketError> {
        self.0.lock().unwrap().insert(hub.id, hub.clone());
        Ok(hub)
    }
    async fn delete(&self, id: HubId) -> Result<(), PocketError> {
        self.0.lock().unwrap().remove(&id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemEntities(Mutex<HashMap<EntityId, Entity>>);

impl EntityRepository for MemEntities {
    async fn create(&self, entity: Entity) -> Result<Entity, PocketError> {
        self.0.lock().unwrap().insert(entity.id, entity.clone());
        Ok(entity)
    }
    async fn get_by_id(&self, id: EntityId) -> Result<Option<Entity>, PocketError> {
        Ok(self.0.lock().unwrap().get(&id).cloned())
    }
    async fn get_all(&self) -> Result<Vec<Entity>, PocketError> {
        Ok(self.0.lock().unwrap().values().cloned().collect())
    }
    async fn find_by_hub_id(&self, hub_id: HubId) -> Result<Vec<Entity>, PocketError> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.hub_id == hub_id)
            .cloned()
            .collect())
    }
    async fn find_by_entity_id(&self, entity_id: &str) -> Result<Option<Entity>, PocketError> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .values()
            .find(|e| e.entity_id == entity_id)
            .cloned())
    }
    async fn update(&self, entity: Entity) -> Result<Entity, PocketError> {
        self.0.lock().unwrap().insert(entity.id, entity.clone());
        Ok(entity)
    }
    async fn delete(&self, id: EntityId) -> Result<(), PocketError> {
        self.0.lock().unwrap().remove(&id);
        Ok(())
    }
}

/// Knows only [`APPLE`], always priced at 100 EUR.
pub struct StaticQuotes;

impl QuoteSource for StaticQuotes {
    async fn instrument_exists(&self, isin: &Isin) -> Result<bool, PocketError> {
        Ok(isin.as_str() == APPLE)
    }
    async fn fetch_quote(&self, isin: &Isin) -> Result<Quote, PocketError> {
        if isin.as_str() != APPLE {
            return Err(PocketError::Upstream(format!("{isin} not found").into()));
        }
        Quote::from_payload(json!({
            "instrumentType": {"mainType": "Share"},
            "price": 100,
            "currency": "EUR",
        }))
        .map_err(|err| PocketError::Upstream(Box::new(err)))
    }
}

pub fn test_state() -> AppState<MemHubs, MemEntities, Arc<InProcessEventBus>, Arc<StaticQuotes>> {
    AppState::new(
        MemHubs::default(),
        MemEntities::default(),
        Arc::new(StaticQuotes),
        Arc::new(InProcessEventBus::default()),
    )
}

pub fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    request(Method::GET, uri)
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

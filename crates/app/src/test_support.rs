//! In-memory port implementations shared by the service and flow tests.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde_json::{Value, json};

use pockethub_domain::entity::Entity;
use pockethub_domain::error::{ConflictError, NotFoundError, PocketError};
use pockethub_domain::hub::Hub;
use pockethub_domain::id::{EntityId, HubId};
use pockethub_domain::isin::Isin;
use pockethub_domain::quote::Quote;

use crate::ports::{EntityRepository, HubRepository, QuoteSource};

#[derive(Default)]
pub struct InMemoryHubRepo {
    store: Mutex<HashMap<HubId, Hub>>,
}

impl HubRepository for InMemoryHubRepo {
    fn create(&self, hub: Hub) -> impl Future<Output = Result<Hub, PocketError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = if store.values().any(|h| h.name == hub.name) {
            Err(ConflictError {
                entity: "Hub",
                key: hub.name.clone(),
            }
            .into())
        } else {
            store.insert(hub.id, hub.clone());
            Ok(hub)
        };
        async { result }
    }

    fn get_by_id(&self, id: HubId) -> impl Future<Output = Result<Option<Hub>, PocketError>> + Send {
        let result = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Hub>, PocketError>> + Send {
        let result = self
            .store
            .lock()
            .unwrap()
            .values()
            .find(|h| h.name == name)
            .cloned();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Hub>, PocketError>> + Send {
        let result: Vec<Hub> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn update(&self, hub: Hub) -> impl Future<Output = Result<Hub, PocketError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = if store.contains_key(&hub.id) {
            store.insert(hub.id, hub.clone());
            Ok(hub)
        } else {
            Err(NotFoundError {
                entity: "Hub",
                id: hub.id.to_string(),
            }
            .into())
        };
        async { result }
    }

    fn delete(&self, id: HubId) -> impl Future<Output = Result<(), PocketError>> + Send {
        self.store.lock().unwrap().remove(&id);
        async { Ok(()) }
    }
}

#[derive(Default)]
pub struct InMemoryEntityRepo {
    store: Mutex<HashMap<EntityId, Entity>>,
}

impl EntityRepository for InMemoryEntityRepo {
    fn create(&self, entity: Entity) -> impl Future<Output = Result<Entity, PocketError>> + Send {
        self.store.lock().unwrap().insert(entity.id, entity.clone());
        async { Ok(entity) }
    }

    fn get_by_id(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<Option<Entity>, PocketError>> + Send {
        let result = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Entity>, PocketError>> + Send {
        let result: Vec<Entity> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn find_by_hub_id(
        &self,
        hub_id: HubId,
    ) -> impl Future<Output = Result<Vec<Entity>, PocketError>> + Send {
        let result: Vec<Entity> = self
            .store
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.hub_id == hub_id)
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn find_by_entity_id(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<Entity>, PocketError>> + Send {
        let result = self
            .store
            .lock()
            .unwrap()
            .values()
            .find(|e| e.entity_id == entity_id)
            .cloned();
        async { Ok(result) }
    }

    fn update(&self, entity: Entity) -> impl Future<Output = Result<Entity, PocketError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = if store.contains_key(&entity.id) {
            store.insert(entity.id, entity.clone());
            Ok(entity)
        } else {
            Err(NotFoundError {
                entity: "Entity",
                id: entity.id.to_string(),
            }
            .into())
        };
        async { result }
    }

    fn delete(&self, id: EntityId) -> impl Future<Output = Result<(), PocketError>> + Send {
        self.store.lock().unwrap().remove(&id);
        async { Ok(()) }
    }
}

/// Quote source answering from canned payloads.
///
/// ISINs without a payload are unknown; ISINs marked as failing return an
/// upstream error from every call.
#[derive(Default)]
pub struct FakeQuoteSource {
    payloads: Mutex<HashMap<String, Value>>,
    failing: Mutex<HashSet<String>>,
    lookups: AtomicUsize,
    fetches: AtomicUsize,
}

impl FakeQuoteSource {
    pub fn with_payload(self, isin: &str, payload: Value) -> Self {
        self.set_payload(isin, payload);
        self
    }

    pub fn with_failure(self, isin: &str) -> Self {
        self.set_failing(isin, true);
        self
    }

    pub fn set_payload(&self, isin: &str, payload: Value) {
        self.payloads
            .lock()
            .unwrap()
            .insert(isin.to_string(), payload);
    }

    pub fn set_failing(&self, isin: &str, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(isin.to_string());
        } else {
            set.remove(isin);
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn failure(&self, isin: &Isin) -> Option<PocketError> {
        self.failing
            .lock()
            .unwrap()
            .contains(isin.as_str())
            .then(|| PocketError::Upstream(format!("{isin} unreachable").into()))
    }
}

impl QuoteSource for FakeQuoteSource {
    fn instrument_exists(
        &self,
        isin: &Isin,
    ) -> impl Future<Output = Result<bool, PocketError>> + Send {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let result = match self.failure(isin) {
            Some(err) => Err(err),
            None => Ok(self.payloads.lock().unwrap().contains_key(isin.as_str())),
        };
        async { result }
    }

    fn fetch_quote(&self, isin: &Isin) -> impl Future<Output = Result<Quote, PocketError>> + Send {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let result = match self.failure(isin) {
            Some(err) => Err(err),
            None => match self.payloads.lock().unwrap().get(isin.as_str()).cloned() {
                Some(payload) => {
                    Quote::from_payload(payload).map_err(|err| PocketError::Upstream(Box::new(err)))
                }
                None => Err(PocketError::Upstream(format!("{isin} not found").into())),
            },
        };
        async { result }
    }
}

/// Minimal share payload with the given price.
pub fn share_payload(price: Value) -> Value {
    json!({
        "name": "Instrument",
        "instrumentType": {"mainType": "Share"},
        "price": price,
        "currency": "EUR",
        "bid": price,
        "ask": price,
    })
}

/// Integration context over an in-memory hub store that records the
/// lifecycle calls flows make.
#[derive(Default)]
pub struct FakeContext {
    pub hubs: InMemoryHubRepo,
    setups: Mutex<Vec<HubId>>,
    reloads: Mutex<Vec<HubId>>,
    removed: Mutex<Vec<(HubId, String)>>,
    failing_create: AtomicBool,
}

impl FakeContext {
    pub async fn insert_hub(&self, hub: Hub) -> Hub {
        self.hubs.create(hub).await.unwrap()
    }

    pub async fn hub(&self, id: HubId) -> Hub {
        self.hubs.get_by_id(id).await.unwrap().unwrap()
    }

    /// Make `create_hub` fail with a storage error until reset.
    pub fn set_create_failing(&self, failing: bool) {
        self.failing_create.store(failing, Ordering::SeqCst);
    }

    pub fn setups(&self) -> Vec<HubId> {
        self.setups.lock().unwrap().clone()
    }

    pub fn reloads(&self) -> Vec<HubId> {
        self.reloads.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<(HubId, String)> {
        self.removed.lock().unwrap().clone()
    }
}

impl crate::ports::IntegrationContext for FakeContext {
    async fn get_hub(&self, id: HubId) -> Result<Option<Hub>, PocketError> {
        self.hubs.get_by_id(id).await
    }

    async fn find_hub_by_name(&self, name: &str) -> Result<Option<Hub>, PocketError> {
        self.hubs.find_by_name(name).await
    }

    async fn create_hub(&self, hub: Hub) -> Result<Hub, PocketError> {
        if self.failing_create.load(Ordering::SeqCst) {
            return Err(PocketError::Storage("database is locked".into()));
        }
        self.hubs.create(hub).await
    }

    async fn update_hub(&self, hub: Hub) -> Result<Hub, PocketError> {
        self.hubs.update(hub).await
    }

    async fn setup_hub(&self, id: HubId) -> Result<(), PocketError> {
        self.setups.lock().unwrap().push(id);
        Ok(())
    }

    async fn reload_hub(&self, id: HubId) -> Result<(), PocketError> {
        self.reloads.lock().unwrap().push(id);
        Ok(())
    }

    async fn remove_entity(
        &self,
        hub_id: HubId,
        unique_id: &str,
    ) -> Result<Option<Entity>, PocketError> {
        self.removed
            .lock()
            .unwrap()
            .push((hub_id, unique_id.to_string()));
        Ok(None)
    }
}

//! Storage port: repository traits for persistence.

use std::future::Future;

use pockethub_domain::entity::Entity;
use pockethub_domain::error::PocketError;
use pockethub_domain::hub::Hub;
use pockethub_domain::id::{EntityId, HubId};

/// Repository for persisting and querying [`Hub`]s.
pub trait HubRepository {
    /// Create a new hub. A hub with the same name is a conflict.
    fn create(&self, hub: Hub) -> impl Future<Output = Result<Hub, PocketError>> + Send;

    /// Get a hub by its unique identifier.
    fn get_by_id(&self, id: HubId) -> impl Future<Output = Result<Option<Hub>, PocketError>> + Send;

    /// Find a hub by its exact name.
    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Hub>, PocketError>> + Send;

    /// Get all hubs.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Hub>, PocketError>> + Send;

    /// Replace an existing hub (name and instrument list).
    fn update(&self, hub: Hub) -> impl Future<Output = Result<Hub, PocketError>> + Send;

    /// Delete a hub by its unique identifier.
    fn delete(&self, id: HubId) -> impl Future<Output = Result<(), PocketError>> + Send;
}

/// Repository for persisting and querying price sensor [`Entity`]s.
pub trait EntityRepository {
    /// Create a new entity in storage.
    fn create(&self, entity: Entity) -> impl Future<Output = Result<Entity, PocketError>> + Send;

    /// Get an entity by its unique identifier.
    fn get_by_id(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<Option<Entity>, PocketError>> + Send;

    /// Get all entities.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Entity>, PocketError>> + Send;

    /// Get all entities belonging to a hub.
    fn find_by_hub_id(
        &self,
        hub_id: HubId,
    ) -> impl Future<Output = Result<Vec<Entity>, PocketError>> + Send;

    /// Find an entity by its human readable `entity_id` (e.g. `sensor.depot_apple`).
    fn find_by_entity_id(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<Entity>, PocketError>> + Send;

    /// Update an existing entity.
    fn update(&self, entity: Entity) -> impl Future<Output = Result<Entity, PocketError>> + Send;

    /// Delete an entity by its unique identifier.
    fn delete(&self, id: EntityId) -> impl Future<Output = Result<(), PocketError>> + Send;
}

//! Entity service: use-cases for managing price sensor entities.

use serde_json::json;

use pockethub_domain::entity::{Entity, unique_entity_id};
use pockethub_domain::error::{NotFoundError, PocketError};
use pockethub_domain::event::{Event, EventType};
use pockethub_domain::id::{EntityId, HubId};
use pockethub_domain::quantity::Quantity;
use pockethub_domain::quote::Quote;
use pockethub_domain::time::now;

use crate::ports::{EntityRepository, EventPublisher};

/// Application service for sensor CRUD and state updates.
///
/// Every mutation publishes the matching domain event.
pub struct EntityService<R, EP> {
    repo: R,
    publisher: EP,
}

impl<R: EntityRepository, EP: EventPublisher> EntityService<R, EP> {
    /// Create a new service backed by the given repository and publisher.
    pub fn new(repo: R, publisher: EP) -> Self {
        Self { repo, publisher }
    }

    /// Persist a new sensor, publishing `EntityCreated`.
    ///
    /// When `entity_id` is already taken a numeric suffix is appended
    /// (`sensor.depot_apple_2`, …).
    ///
    /// # Errors
    ///
    /// Returns [`PocketError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, entity), fields(entity_id = %entity.entity_id))]
    pub async fn register_entity(&self, mut entity: Entity) -> Result<Entity, PocketError> {
        entity.validate()?;
        entity.entity_id = self.allocate_entity_id(&entity.entity_id).await?;
        let ts = now();
        entity.last_changed = ts;
        entity.last_updated = ts;

        let created = self.repo.create(entity).await?;
        self.publisher
            .publish(Event::new(
                EventType::EntityCreated,
                Some(created.id),
                json!({
                    "entity_id": created.entity_id,
                    "unique_id": created.unique_id,
                    "hub_id": created.hub_id.to_string(),
                }),
            ))
            .await?;
        tracing::info!(entity_id = %created.entity_id, "sensor registered");
        Ok(created)
    }

    /// First free entity id derived from `base`.
    async fn allocate_entity_id(&self, base: &str) -> Result<String, PocketError> {
        let taken: Vec<String> = self
            .repo
            .get_all()
            .await?
            .into_iter()
            .map(|e| e.entity_id)
            .filter(|id| id.starts_with(base))
            .collect();
        Ok(unique_entity_id(base, |candidate| {
            taken.iter().any(|id| id == candidate)
        }))
    }

    /// Look up an entity by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`PocketError::NotFound`] when no entity with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_entity(&self, id: EntityId) -> Result<Entity, PocketError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Entity",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Find an entity by its `sensor.*` id.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn find_by_entity_id(&self, entity_id: &str) -> Result<Option<Entity>, PocketError> {
        self.repo.find_by_entity_id(entity_id).await
    }

    /// List all entities.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_entities(&self) -> Result<Vec<Entity>, PocketError> {
        self.repo.get_all().await
    }

    /// List the sensors of one hub.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_by_hub(&self, hub_id: HubId) -> Result<Vec<Entity>, PocketError> {
        self.repo.find_by_hub_id(hub_id).await
    }

    /// Persist changes to an existing entity.
    ///
    /// # Errors
    ///
    /// Returns [`PocketError::Validation`] if invariants fail, or a
    /// storage error from the repository.
    pub async fn update_entity(&self, entity: Entity) -> Result<Entity, PocketError> {
        entity.validate()?;
        self.repo.update(entity).await
    }

    /// Apply a fetched quote to a sensor and persist it.
    ///
    /// `StateChanged` is published only when the price actually moved.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn apply_quote(
        &self,
        mut entity: Entity,
        quote: &Quote,
        quantity: Quantity,
    ) -> Result<Entity, PocketError> {
        let old_state = entity.state;
        let changed = entity.apply_quote(quote, quantity, now());
        let entity = self.repo.update(entity).await?;

        if changed {
            tracing::debug!(
                entity_id = %entity.entity_id,
                %old_state,
                new_state = %entity.state,
                "sensor state changed"
            );
            self.publisher
                .publish(Event::new(
                    EventType::StateChanged,
                    Some(entity.id),
                    json!({
                        "entity_id": entity.entity_id,
                        "old_state": old_state.to_string(),
                        "new_state": entity.state.to_string(),
                    }),
                ))
                .await?;
        }
        Ok(entity)
    }

    /// Delete an entity, publishing `EntityRemoved`.
    ///
    /// # Errors
    ///
    /// Returns [`PocketError::NotFound`] if the entity does not exist,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn remove_entity(&self, id: EntityId) -> Result<Entity, PocketError> {
        let entity = self.get_entity(id).await?;
        self.repo.delete(id).await?;
        self.publisher
            .publish(Event::new(
                EventType::EntityRemoved,
                Some(entity.id),
                json!({
                    "entity_id": entity.entity_id,
                    "unique_id": entity.unique_id,
                    "hub_id": entity.hub_id.to_string(),
                }),
            ))
            .await?;
        tracing::info!(entity_id = %entity.entity_id, "sensor removed");
        Ok(entity)
    }

    /// Delete the sensor of `hub_id` with the given unique id, if any.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn remove_by_unique_id(
        &self,
        hub_id: HubId,
        unique_id: &str,
    ) -> Result<Option<Entity>, PocketError> {
        let found = self
            .repo
            .find_by_hub_id(hub_id)
            .await?
            .into_iter()
            .find(|e| e.unique_id.eq_ignore_ascii_case(unique_id));
        match found {
            Some(entity) => self.remove_entity(entity.id).await.map(Some),
            None => {
                tracing::warn!(%hub_id, unique_id, "no sensor registered with this unique id");
                Ok(None)
            }
        }
    }
}

//! Hub service: lifecycle of hubs and their sensors.
//!
//! Setting a hub up registers one sensor per tracked instrument, removes
//! sensors whose instrument is gone, and refreshes everything once so the
//! sensors start with a real price. Unloading only stops polling; the
//! sensors stay persisted until the hub is removed.

use std::sync::Arc;

use pockethub_domain::entity::{Entity, base_entity_id, friendly_name};
use pockethub_domain::error::{ConflictError, NotFoundError, PocketError};
use pockethub_domain::event::{Event, EventType};
use pockethub_domain::hub::Hub;
use pockethub_domain::id::HubId;

use crate::ports::{EntityRepository, EventPublisher, HubRepository, QuoteSource};
use crate::registry::{HubRegistry, LoadedHub};
use crate::services::entity_service::EntityService;
use crate::services::refresh_service::RefreshService;

/// Application service for hub CRUD and setup/teardown.
pub struct HubService<HR, ER, EP, QS> {
    hubs: HR,
    entities: Arc<EntityService<ER, EP>>,
    refresh: Arc<RefreshService<ER, EP, QS>>,
    registry: HubRegistry,
    publisher: EP,
}

impl<HR, ER, EP, QS> HubService<HR, ER, EP, QS>
where
    HR: HubRepository + Send + Sync,
    ER: EntityRepository + Send + Sync,
    EP: EventPublisher + Send + Sync,
    QS: QuoteSource + Send + Sync,
{
    pub fn new(
        hubs: HR,
        entities: Arc<EntityService<ER, EP>>,
        refresh: Arc<RefreshService<ER, EP, QS>>,
        registry: HubRegistry,
        publisher: EP,
    ) -> Self {
        Self {
            hubs,
            entities,
            refresh,
            registry,
            publisher,
        }
    }

    /// Persist a new hub.
    ///
    /// # Errors
    ///
    /// Returns [`PocketError::Validation`] if invariants fail,
    /// [`PocketError::Conflict`] when the name is taken, or a storage error.
    #[tracing::instrument(skip(self, hub), fields(hub = %hub.name))]
    pub async fn create_hub(&self, hub: Hub) -> Result<Hub, PocketError> {
        hub.validate()?;
        if self.hubs.find_by_name(&hub.name).await?.is_some() {
            return Err(ConflictError {
                entity: "Hub",
                key: hub.name,
            }
            .into());
        }
        let created = self.hubs.create(hub).await?;
        tracing::info!(hub_id = %created.id, instruments = created.instruments.len(), "hub created");
        Ok(created)
    }

    /// Look up a hub by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`PocketError::NotFound`] when no hub with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_hub(&self, id: HubId) -> Result<Hub, PocketError> {
        self.find_hub(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Hub",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn find_hub(&self, id: HubId) -> Result<Option<Hub>, PocketError> {
        self.hubs.get_by_id(id).await
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Hub>, PocketError> {
        self.hubs.find_by_name(name).await
    }

    /// List all hubs, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_hubs(&self) -> Result<Vec<Hub>, PocketError> {
        let mut hubs = self.hubs.get_all().await?;
        hubs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(hubs)
    }

    /// Persist changes to a hub. Loaded hubs pick them up on the next reload.
    ///
    /// # Errors
    ///
    /// Returns [`PocketError::Validation`] if invariants fail, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, hub), fields(hub = %hub.name))]
    pub async fn update_hub(&self, hub: Hub) -> Result<Hub, PocketError> {
        hub.validate()?;
        self.hubs.update(hub).await
    }

    /// Load a hub and register its sensors.
    ///
    /// Every sensor is refreshed once before this returns. A hub without
    /// instruments is loaded with no sensors.
    ///
    /// # Errors
    ///
    /// Returns [`PocketError::NotFound`] for an unknown hub, or a storage
    /// error. The hub is not left loaded on failure.
    #[tracing::instrument(skip(self))]
    pub async fn setup_hub(&self, id: HubId) -> Result<Vec<Entity>, PocketError> {
        let hub = self.get_hub(id).await?;
        let loaded = LoadedHub::from(&hub);
        self.registry.insert(loaded.clone()).await;

        let sensors = match self.sync_sensors(&hub).await {
            Ok(sensors) => sensors,
            Err(err) => {
                self.registry.remove(id).await;
                return Err(err);
            }
        };

        self.publisher
            .publish(Event::new(EventType::HubLoaded, None, loaded.event_data()))
            .await?;
        tracing::info!(hub = %hub.name, sensors = sensors.len(), "hub loaded");
        Ok(sensors)
    }

    async fn sync_sensors(&self, hub: &Hub) -> Result<Vec<Entity>, PocketError> {
        let existing = self.entities.list_by_hub(hub.id).await?;

        for stale in existing
            .iter()
            .filter(|e| !hub.instruments.iter().any(|i| i.unique_id() == e.unique_id))
        {
            self.entities.remove_entity(stale.id).await?;
        }

        if hub.instruments.is_empty() {
            tracing::warn!(hub = %hub.name, "no instruments configured for this hub");
            return Ok(Vec::new());
        }

        let mut sensors = Vec::with_capacity(hub.instruments.len());
        for inst in &hub.instruments {
            let unique_id = inst.unique_id();
            let name = friendly_name(&hub.name, &inst.name);
            let entity = match existing.iter().find(|e| e.unique_id == unique_id) {
                Some(current) if current.friendly_name == name => current.clone(),
                Some(current) => {
                    let mut renamed = current.clone();
                    renamed.friendly_name = name;
                    self.entities.update_entity(renamed).await?
                }
                None => {
                    let entity = Entity::builder()
                        .hub_id(hub.id)
                        .unique_id(unique_id)
                        .entity_id(base_entity_id(&hub.name, &inst.name))
                        .friendly_name(name)
                        .build()?;
                    self.entities.register_entity(entity).await?
                }
            };
            sensors.push(self.refresh.refresh_entity(entity).await?);
        }
        Ok(sensors)
    }

    /// Stop polling a hub. Returns whether it was loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the `HubUnloaded` event cannot be published.
    #[tracing::instrument(skip(self))]
    pub async fn unload_hub(&self, id: HubId) -> Result<bool, PocketError> {
        let Some(loaded) = self.registry.remove(id).await else {
            return Ok(false);
        };
        self.publisher
            .publish(Event::new(EventType::HubUnloaded, None, loaded.event_data()))
            .await?;
        tracing::info!(hub = %loaded.name, "hub unloaded");
        Ok(true)
    }

    /// Unload then set up a hub again.
    ///
    /// # Errors
    ///
    /// Same as [`setup_hub`](Self::setup_hub).
    pub async fn reload_hub(&self, id: HubId) -> Result<Vec<Entity>, PocketError> {
        self.unload_hub(id).await?;
        self.setup_hub(id).await
    }

    /// Unload a hub, delete its sensors and the hub itself.
    ///
    /// # Errors
    ///
    /// Returns [`PocketError::NotFound`] for an unknown hub, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn remove_hub(&self, id: HubId) -> Result<(), PocketError> {
        let hub = self.get_hub(id).await?;
        self.unload_hub(id).await?;
        for entity in self.entities.list_by_hub(id).await? {
            self.entities.remove_entity(entity.id).await?;
        }
        self.hubs.delete(id).await?;
        self.publisher
            .publish(Event::new(
                EventType::HubRemoved,
                None,
                LoadedHub::from(&hub).event_data(),
            ))
            .await?;
        tracing::info!(hub = %hub.name, "hub removed");
        Ok(())
    }

    /// Set up every persisted hub, returning how many loaded.
    ///
    /// A hub that fails to set up is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the hubs cannot be listed.
    pub async fn setup_all(&self) -> Result<usize, PocketError> {
        let mut loaded = 0;
        for hub in self.hubs.get_all().await? {
            match self.setup_hub(hub.id).await {
                Ok(_) => loaded += 1,
                Err(err) => {
                    tracing::error!(hub = %hub.name, error = %err, "hub not ready, skipping");
                }
            }
        }
        Ok(loaded)
    }

    /// Currently loaded hubs, ordered by name.
    pub async fn loaded_hubs(&self) -> Vec<LoadedHub> {
        self.registry.all().await
    }

    /// Whether a hub is currently loaded.
    pub async fn is_loaded(&self, id: HubId) -> bool {
        self.registry.is_loaded(id).await
    }
}

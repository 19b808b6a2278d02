//! Concrete [`IntegrationContext`] backed by application services.

use std::sync::Arc;

use pockethub_domain::entity::Entity;
use pockethub_domain::error::PocketError;
use pockethub_domain::hub::Hub;
use pockethub_domain::id::HubId;

use crate::ports::{
    EntityRepository, EventPublisher, HubRepository, IntegrationContext, QuoteSource,
};
use crate::services::entity_service::EntityService;
use crate::services::hub_service::HubService;

/// [`IntegrationContext`] implementation that delegates to `HubService`
/// and `EntityService`.
///
/// Wraps `Arc`-ed services so it is cheaply cloneable and `Send + Sync`.
/// The generic parameters are confined to this struct: flows see only the
/// [`IntegrationContext`] trait.
pub struct ServiceContext<HR, ER, EP, QS> {
    hub_service: Arc<HubService<HR, ER, EP, QS>>,
    entity_service: Arc<EntityService<ER, EP>>,
}

impl<HR, ER, EP, QS> ServiceContext<HR, ER, EP, QS> {
    pub fn new(
        hub_service: Arc<HubService<HR, ER, EP, QS>>,
        entity_service: Arc<EntityService<ER, EP>>,
    ) -> Self {
        Self {
            hub_service,
            entity_service,
        }
    }
}

impl<HR, ER, EP, QS> Clone for ServiceContext<HR, ER, EP, QS> {
    fn clone(&self) -> Self {
        Self {
            hub_service: Arc::clone(&self.hub_service),
            entity_service: Arc::clone(&self.entity_service),
        }
    }
}

impl<HR, ER, EP, QS> IntegrationContext for ServiceContext<HR, ER, EP, QS>
where
    HR: HubRepository + Send + Sync + 'static,
    ER: EntityRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    QS: QuoteSource + Send + Sync + 'static,
{
    async fn get_hub(&self, id: HubId) -> Result<Option<Hub>, PocketError> {
        self.hub_service.find_hub(id).await
    }

    async fn find_hub_by_name(&self, name: &str) -> Result<Option<Hub>, PocketError> {
        self.hub_service.find_by_name(name).await
    }

    async fn create_hub(&self, hub: Hub) -> Result<Hub, PocketError> {
        self.hub_service.create_hub(hub).await
    }

    async fn update_hub(&self, hub: Hub) -> Result<Hub, PocketError> {
        self.hub_service.update_hub(hub).await
    }

    async fn setup_hub(&self, id: HubId) -> Result<(), PocketError> {
        self.hub_service.setup_hub(id).await.map(|_| ())
    }

    async fn reload_hub(&self, id: HubId) -> Result<(), PocketError> {
        self.hub_service.reload_hub(id).await.map(|_| ())
    }

    async fn remove_entity(
        &self,
        hub_id: HubId,
        unique_id: &str,
    ) -> Result<Option<Entity>, PocketError> {
        self.entity_service
            .remove_by_unique_id(hub_id, unique_id)
            .await
    }
}

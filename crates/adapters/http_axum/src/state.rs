//! Shared application state for axum handlers.

use std::sync::Arc;

use pockethub_app::event_bus::InProcessEventBus;
use pockethub_app::ports::{EntityRepository, HubRepository, QuoteSource};
use pockethub_app::registry::HubRegistry;
use pockethub_app::services::entity_service::EntityService;
use pockethub_app::services::flow_service::FlowService;
use pockethub_app::services::hub_service::HubService;
use pockethub_app::services::integration_context::ServiceContext;
use pockethub_app::services::refresh_service::RefreshService;

/// Flow manager wired to the service-backed integration context.
pub type AppFlowService<HR, ER, EP, QS> = FlowService<ServiceContext<HR, ER, EP, QS>, QS>;

/// Application state shared across all axum handlers.
///
/// Generic over the repositories, event publisher and quote source to avoid
/// dynamic dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone`: only the `Arc` wrappers are cloned.
pub struct AppState<HR, ER, EP, QS> {
    pub flow_service: Arc<AppFlowService<HR, ER, EP, QS>>,
    pub hub_service: Arc<HubService<HR, ER, EP, QS>>,
    pub entity_service: Arc<EntityService<ER, EP>>,
    pub refresh_service: Arc<RefreshService<ER, EP, QS>>,
    /// Source of the SSE stream.
    pub event_bus: Arc<InProcessEventBus>,
}

impl<HR, ER, EP, QS> Clone for AppState<HR, ER, EP, QS> {
    fn clone(&self) -> Self {
        Self {
            flow_service: Arc::clone(&self.flow_service),
            hub_service: Arc::clone(&self.hub_service),
            entity_service: Arc::clone(&self.entity_service),
            refresh_service: Arc::clone(&self.refresh_service),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}

impl<HR, ER, QS> AppState<HR, ER, Arc<InProcessEventBus>, QS>
where
    HR: HubRepository + Send + Sync + 'static,
    ER: EntityRepository + Send + Sync + 'static,
    QS: QuoteSource + Clone + Send + Sync + 'static,
{
    /// Wire the application services on top of the given adapters.
    ///
    /// Every service publishes on `event_bus`, and all of them share one
    /// [`HubRegistry`] and one quote source.
    pub fn new(hubs: HR, entities: ER, quotes: QS, event_bus: Arc<InProcessEventBus>) -> Self {
        let registry = HubRegistry::new();
        let entity_service = Arc::new(EntityService::new(entities, Arc::clone(&event_bus)));
        let refresh_service = Arc::new(RefreshService::new(
            Arc::clone(&entity_service),
            quotes.clone(),
            registry.clone(),
        ));
        let hub_service = Arc::new(HubService::new(
            hubs,
            Arc::clone(&entity_service),
            Arc::clone(&refresh_service),
            registry,
            Arc::clone(&event_bus),
        ));
        let context = ServiceContext::new(Arc::clone(&hub_service), Arc::clone(&entity_service));
        let flow_service = Arc::new(FlowService::new(context, quotes));

        Self {
            flow_service,
            hub_service,
            entity_service,
            refresh_service,
            event_bus,
        }
    }
}

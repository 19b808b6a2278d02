//! Refresh service: polls the quote source and updates sensor state.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use pockethub_domain::entity::Entity;
use pockethub_domain::error::{NotFoundError, PocketError};
use pockethub_domain::id::EntityId;
use pockethub_domain::isin::Isin;

use crate::ports::{EntityRepository, EventPublisher, QuoteSource};
use crate::registry::HubRegistry;
use crate::services::entity_service::EntityService;

/// Interval between two polls when nothing else is configured.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Fetches quotes for the sensors of loaded hubs.
pub struct RefreshService<ER, EP, QS> {
    entities: Arc<EntityService<ER, EP>>,
    quotes: QS,
    registry: HubRegistry,
}

impl<ER, EP, QS> RefreshService<ER, EP, QS>
where
    ER: EntityRepository + Send + Sync,
    EP: EventPublisher + Send + Sync,
    QS: QuoteSource + Send + Sync,
{
    pub fn new(entities: Arc<EntityService<ER, EP>>, quotes: QS, registry: HubRegistry) -> Self {
        Self {
            entities,
            quotes,
            registry,
        }
    }

    /// Fetch a fresh quote for one sensor and store it.
    ///
    /// A failed fetch is logged and the sensor keeps its previous state
    /// and attributes; the unchanged entity is returned.
    ///
    /// # Errors
    ///
    /// Returns [`PocketError::NotFound`] when the sensor's hub is not loaded
    /// or no longer tracks its instrument, and storage errors.
    #[tracing::instrument(skip(self, entity), fields(entity_id = %entity.entity_id))]
    pub async fn refresh_entity(&self, entity: Entity) -> Result<Entity, PocketError> {
        let hub = self.registry.get(entity.hub_id).await.ok_or_else(|| NotFoundError {
            entity: "Loaded hub",
            id: entity.hub_id.to_string(),
        })?;
        let quantity = hub
            .quantity_of(&entity.unique_id)
            .ok_or_else(|| NotFoundError {
                entity: "Instrument",
                id: entity.unique_id.clone(),
            })?;
        let isin = Isin::from_str(&entity.unique_id)
            .map_err(|err| PocketError::Validation(err.into()))?;

        match self.quotes.fetch_quote(&isin).await {
            Ok(quote) => self.entities.apply_quote(entity, &quote, quantity).await,
            Err(err) => {
                tracing::warn!(%isin, error = %err, "failed to fetch quote, keeping previous state");
                Ok(entity)
            }
        }
    }

    /// Refresh a sensor by id.
    ///
    /// # Errors
    ///
    /// Same as [`refresh_entity`](Self::refresh_entity), plus
    /// [`PocketError::NotFound`] for an unknown id.
    pub async fn refresh_by_id(&self, id: EntityId) -> Result<Entity, PocketError> {
        let entity = self.entities.get_entity(id).await?;
        self.refresh_entity(entity).await
    }

    /// Refresh every sensor of every loaded hub, returning how many were
    /// processed. Failures are logged per sensor.
    pub async fn refresh_all(&self) -> usize {
        let mut refreshed = 0;
        for hub in self.registry.all().await {
            let entities = match self.entities.list_by_hub(hub.id).await {
                Ok(entities) => entities,
                Err(err) => {
                    tracing::error!(hub = %hub.name, error = %err, "failed to list sensors");
                    continue;
                }
            };
            for entity in entities {
                match self.refresh_entity(entity).await {
                    Ok(_) => refreshed += 1,
                    Err(err) => tracing::warn!(hub = %hub.name, error = %err, "sensor refresh failed"),
                }
            }
        }
        tracing::debug!(refreshed, "refresh cycle complete");
        refreshed
    }

    /// Refresh all sensors every `interval` until `shutdown` flips to `true`.
    ///
    /// The first refresh happens one interval after the call, since setting
    /// a hub up already refreshes its sensors.
    pub async fn run_poll_loop(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let start = tokio::time::Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(interval_secs = interval.as_secs(), "quote polling started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh_all().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("quote polling stopped");
    }
}

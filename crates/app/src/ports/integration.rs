//! Integration port: what the setup and options wizards need from the rest
//! of the system.
//!
//! The wizards never talk to repositories or services directly. They persist
//! hubs, trigger (re)loads and drop sensors through this trait, so they can
//! be driven against a fake in tests. The application provides a concrete
//! implementation backed by `HubService` and `EntityService`.

use std::future::Future;

use pockethub_domain::entity::Entity;
use pockethub_domain::error::PocketError;
use pockethub_domain::hub::Hub;
use pockethub_domain::id::HubId;

/// Context handed to flows for persisting their results.
pub trait IntegrationContext: Send + Sync {
    /// Look up a hub.
    fn get_hub(&self, id: HubId) -> impl Future<Output = Result<Option<Hub>, PocketError>> + Send;

    /// Look up a hub by its name.
    fn find_hub_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Hub>, PocketError>> + Send;

    /// Persist a new hub.
    fn create_hub(&self, hub: Hub) -> impl Future<Output = Result<Hub, PocketError>> + Send;

    /// Persist changes to an existing hub.
    fn update_hub(&self, hub: Hub) -> impl Future<Output = Result<Hub, PocketError>> + Send;

    /// Load a hub: register its sensors and refresh them once.
    fn setup_hub(&self, id: HubId) -> impl Future<Output = Result<(), PocketError>> + Send;

    /// Unload and set up a hub again so instrument changes take effect.
    fn reload_hub(&self, id: HubId) -> impl Future<Output = Result<(), PocketError>> + Send;

    /// Remove the sensor of `hub_id` whose unique id is `unique_id`.
    ///
    /// Returns the removed entity, or `None` when no sensor matched.
    fn remove_entity(
        &self,
        hub_id: HubId,
        unique_id: &str,
    ) -> impl Future<Output = Result<Option<Entity>, PocketError>> + Send;
}
